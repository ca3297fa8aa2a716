// Resource chart: each row is a person, each period an assignment.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_ganttview::{
    ChartMode, ControllerConfig, GanttController, GanttTree, GanttView, GanttViewStyle,
    GridColumns, Marker, Period, Task, TaskNameLabel,
};

fn main() {
    let mut tree = GanttTree::new();
    tree.add_root(
        Task::new("Alice")
            .with_period(Period::new("2024-05-01", "2024-05-06").with_id("spec"))
            .with_period(
                Period::new("2024-05-13", "2024-05-20")
                    .with_id("review")
                    .connect_to("impl", None),
            )
            .with_marker(Marker::at("2024-05-10")),
    );
    tree.add_root(
        Task::new("Bob")
            .with_period(
                Period::new("2024-05-06", "2024-05-13")
                    .with_id("impl")
                    .connect_to("spec", None),
            ),
    );

    let mut state = GanttController::new(ControllerConfig::resources().terminal());
    let columns = GridColumns::<3, GanttTree>::standard();
    let style = GanttViewStyle {
        grid_width: Some(16),
        ..GanttViewStyle::default()
    };

    let area = Rect::new(0, 0, 72, 6);
    let mut buffer = Buffer::empty(area);
    GanttView::new(&tree, &TaskNameLabel, &columns, style).render(area, &mut buffer, &mut state);
    assert!(state.is_resources());
    assert_eq!(state.config().mode, ChartMode::Resource);

    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        println!("{}", line.trim_end());
    }
    for connector in state.connectors() {
        println!("{:?} -> {:?}", connector.from, connector.to);
    }
}
