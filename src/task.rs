use std::fmt;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Loosely typed field value as it arrives from the data source.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Interprets the value as a plain number (`"12.5"` and `12.5` both work).
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Bool(_) => None,
        };
        number.filter(|value| value.is_finite())
    }

    /// Interprets the value as a ratio: `"50%"` is `0.5`, numbers are taken as is.
    pub fn as_ratio(&self) -> Option<f64> {
        if let Self::Text(text) = self
            && let Some(percent) = text.trim().strip_suffix('%')
        {
            return percent
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| value / 100.0);
        }
        self.as_number()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RawValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Dependency type between two tasks or periods.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    #[default]
    FinishStart,
    FinishFinish,
    StartStart,
    StartFinish,
}

/// Free-form visual settings attached to a connector.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectorStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
}

/// One entry of the array-of-connectors form.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectorSpec {
    #[cfg_attr(feature = "serde", serde(default))]
    pub connect_to: String,
    pub connector_type: Option<ConnectorKind>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub style: ConnectorStyle,
}

/// Connector fields shared by tasks and periods.
///
/// When `connectors` is present it takes precedence over the single-connector fields
/// (`connect_to`, `connector_type`, `connector`).
///
/// On the wire both forms share the `connector` key: an array is the list form, an
/// object holds the settings of the single connector. A list therefore serializes
/// without the single-connector settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "ConnectorFieldsRepr", into = "ConnectorFieldsRepr")
)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectorFields {
    pub connectors: Option<Vec<ConnectorSpec>>,
    pub connect_to: Option<String>,
    pub connector_type: Option<ConnectorKind>,
    pub connector: Option<ConnectorStyle>,
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConnectorValue {
    List(Vec<ConnectorSpec>),
    Settings(ConnectorStyle),
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorFieldsRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connector_type: Option<ConnectorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connector: Option<ConnectorValue>,
}

#[cfg(feature = "serde")]
impl From<ConnectorFieldsRepr> for ConnectorFields {
    fn from(repr: ConnectorFieldsRepr) -> Self {
        let (connectors, connector) = match repr.connector {
            Some(ConnectorValue::List(list)) => (Some(list), None),
            Some(ConnectorValue::Settings(style)) => (None, Some(style)),
            None => (None, None),
        };
        Self {
            connectors,
            connect_to: repr.connect_to,
            connector_type: repr.connector_type,
            connector,
        }
    }
}

#[cfg(feature = "serde")]
impl From<ConnectorFields> for ConnectorFieldsRepr {
    fn from(fields: ConnectorFields) -> Self {
        let connector = match fields.connectors {
            Some(list) => Some(ConnectorValue::List(list)),
            None => fields.connector.map(ConnectorValue::Settings),
        };
        Self {
            connect_to: fields.connect_to,
            connector_type: fields.connector_type,
            connector,
        }
    }
}

/// Borrowed view of a single outgoing connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectorLink<'a> {
    pub connect_to: &'a str,
    pub kind: Option<ConnectorKind>,
    pub style: Option<&'a ConnectorStyle>,
}

impl ConnectorFields {
    /// Returns every outgoing connector, skipping entries without a target.
    pub fn links(&self) -> SmallVec<[ConnectorLink<'_>; 4]> {
        let mut links = SmallVec::new();
        if let Some(connectors) = &self.connectors {
            links.extend(
                connectors
                    .iter()
                    .filter(|spec| !spec.connect_to.is_empty())
                    .map(|spec| ConnectorLink {
                        connect_to: spec.connect_to.as_str(),
                        kind: spec.connector_type,
                        style: Some(&spec.style),
                    }),
            );
        } else if let Some(target) = self.connect_to.as_deref().filter(|id| !id.is_empty()) {
            links.push(ConnectorLink {
                connect_to: target,
                kind: self.connector_type,
                style: self.connector.as_ref(),
            });
        }
        links
    }
}

/// A time slot of a resource row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Period {
    pub id: Option<String>,
    pub start: Option<RawValue>,
    pub end: Option<RawValue>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub links: ConnectorFields,
}

impl Period {
    pub fn new(start: impl Into<RawValue>, end: impl Into<RawValue>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn connect_to(mut self, id: impl Into<String>, kind: Option<ConnectorKind>) -> Self {
        push_spec(&mut self.links, id.into(), kind);
        self
    }
}

/// A point in time drawn across a row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Marker {
    pub value: Option<RawValue>,
}

impl Marker {
    pub fn at(value: impl Into<RawValue>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}

/// Source fields of a single Gantt row (a project task or a resource).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Task {
    pub id: Option<String>,
    pub name: String,
    pub row_height: Option<RawValue>,
    pub collapsed: Option<bool>,
    pub actual_start: Option<RawValue>,
    pub actual_end: Option<RawValue>,
    pub baseline_start: Option<RawValue>,
    pub baseline_end: Option<RawValue>,
    pub progress_value: Option<RawValue>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub periods: Vec<Period>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub markers: Vec<Marker>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub links: ConnectorFields,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_actual(mut self, start: impl Into<RawValue>, end: impl Into<RawValue>) -> Self {
        self.actual_start = Some(start.into());
        self.actual_end = Some(end.into());
        self
    }

    #[must_use]
    pub fn with_baseline(mut self, start: impl Into<RawValue>, end: impl Into<RawValue>) -> Self {
        self.baseline_start = Some(start.into());
        self.baseline_end = Some(end.into());
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl Into<RawValue>) -> Self {
        self.progress_value = Some(progress.into());
        self
    }

    #[must_use]
    pub fn with_row_height(mut self, height: impl Into<RawValue>) -> Self {
        self.row_height = Some(height.into());
        self
    }

    #[must_use]
    pub const fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.periods.push(period);
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    #[must_use]
    pub fn connect_to(mut self, id: impl Into<String>, kind: Option<ConnectorKind>) -> Self {
        push_spec(&mut self.links, id.into(), kind);
        self
    }

    /// Explicit positive row height, if the field holds one.
    pub fn row_height(&self) -> Option<f64> {
        self.row_height
            .as_ref()
            .and_then(RawValue::as_number)
            .filter(|height| *height > 0.0)
    }

    /// Explicit progress ratio, if the field holds one.
    pub fn progress(&self) -> Option<f64> {
        self.progress_value.as_ref().and_then(RawValue::as_ratio)
    }
}

fn push_spec(links: &mut ConnectorFields, connect_to: String, kind: Option<ConnectorKind>) {
    links
        .connectors
        .get_or_insert_with(Vec::new)
        .push(ConnectorSpec {
            connect_to,
            connector_type: kind,
            style: ConnectorStyle::default(),
        });
}
