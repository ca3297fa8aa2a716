use std::env;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Duration as Span, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};
use tracing_subscriber::EnvFilter;

use tui_ganttview::{
    ControllerConfig, GanttController, GanttEvent, GanttTree, GanttView, GanttViewStyle,
    GridColumns, KeymapProfile, Marker, NodeId, Task, TaskNameLabel, TaskNode,
};

fn day(offset: i64) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap_or_default();
    (base + Span::days(offset)).format("%Y-%m-%d").to_string()
}

fn phase(name: &str, first_day: i64, steps: &[(&str, i64, f64)]) -> TaskNode {
    let mut cursor = first_day;
    let children = steps
        .iter()
        .map(|&(step, days, progress)| {
            let task = Task::new(format!("{name}: {step}"))
                .with_id(format!("{name}/{step}"))
                .with_actual(day(cursor), day(cursor + days))
                .with_baseline(day(cursor - 1), day(cursor + days - 1))
                .with_progress(progress);
            cursor += days;
            TaskNode::leaf(task)
        })
        .collect();
    TaskNode::new(Task::new(name).with_id(name), children)
}

fn build_tree() -> GanttTree {
    let mut nodes = vec![
        phase(
            "Discovery",
            0,
            &[("interviews", 5, 1.0), ("survey", 3, 1.0), ("report", 2, 0.8)],
        ),
        phase(
            "Design",
            10,
            &[("wireframes", 4, 0.6), ("prototype", 6, 0.3), ("review", 2, 0.0)],
        ),
        phase(
            "Build",
            22,
            &[("backend", 14, 0.1), ("frontend", 12, 0.0), ("integration", 5, 0.0)],
        ),
        phase("Launch", 53, &[("beta", 7, 0.0), ("release", 1, 0.0)]),
    ];
    nodes.push(TaskNode::leaf(
        Task::new("Go live")
            .with_actual(day(61), day(61))
            .with_marker(Marker::at(day(30)))
            .connect_to("Launch/release", None),
    ));
    GanttTree::from_nodes(nodes)
}

fn style<'a>() -> GanttViewStyle<'a> {
    GanttViewStyle {
        title: Some(Line::from(" Plan (q quit, c collapse top row, n add task) ")),
        header_style: Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        bar_style: Style::default().fg(Color::Blue),
        progress_style: Style::default().fg(Color::Green),
        baseline_style: Style::default().fg(Color::DarkGray),
        milestone_style: Style::default().fg(Color::Magenta),
        marker_style: Style::default().fg(Color::Red),
        connector_style: Style::default().fg(Color::Cyan),
        ..GanttViewStyle::default()
    }
}

fn render(
    frame: &mut Frame,
    tree: &GanttTree,
    columns: &GridColumns<3, GanttTree>,
    state: &mut GanttController<NodeId>,
    style: &GanttViewStyle<'_>,
) {
    let widget = GanttView::new(tree, &TaskNameLabel, columns, style.clone());
    frame.render_stateful_widget(widget, frame.area(), state);
}

fn run_app(mut terminal: DefaultTerminal, mut tree: GanttTree) -> io::Result<()> {
    let columns = GridColumns::<3, GanttTree>::standard();
    let style = style();
    let mut state = GanttController::new(ControllerConfig::project().terminal());
    state.keymap_mut().set_profile(KeymapProfile::Vim);
    let mut added = 0usize;

    loop {
        state.sync(&mut tree);
        terminal.draw(|frame| render(frame, &tree, &columns, &mut state, &style))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('c') => {
                let top = state
                    .start_index()
                    .and_then(|row| state.visible_items().get(row).copied());
                if let Some(id) = top {
                    state.toggle_collapsed(&tree, id);
                }
            }
            KeyCode::Char('n') => {
                added += 1;
                let offset = i64::try_from(added).unwrap_or_default();
                tree.add_root(
                    Task::new(format!("Follow-up {added}"))
                        .with_actual(day(62 + offset), day(64 + offset)),
                );
                state.scroll_to_end(None);
            }
            _ => {
                if let GanttEvent::Unhandled = state.handle_key(&tree, key) {
                    tracing::debug!(?key, "key ignored");
                }
            }
        }
    }
    Ok(())
}

fn init_tracing() -> io::Result<()> {
    // GANTT_LOG=path writes diagnostics to a file; the terminal is busy with the UI.
    let Some(path) = env::var_os("GANTT_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    init_tracing()?;
    let terminal = ratatui::init();
    let result = run_app(terminal, build_tree());
    ratatui::restore();
    result
}
