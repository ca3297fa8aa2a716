// Minimal example: a small project plan rendered into an in-memory buffer.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_ganttview::{
    ControllerConfig, GanttController, GanttTree, GanttView, GanttViewStyle, GridColumns,
    Task, TaskNameLabel, TaskNode,
};

fn main() {
    // Parents without dates take their span and progress from the children.
    let tree = GanttTree::from_nodes(vec![TaskNode::new(
        Task::new("Release 1.0"),
        vec![
            TaskNode::leaf(
                Task::new("Design")
                    .with_id("design")
                    .with_actual("2024-03-01", "2024-03-08")
                    .with_progress(1.0),
            ),
            TaskNode::leaf(
                Task::new("Build")
                    .with_id("build")
                    .with_actual("2024-03-08", "2024-03-22")
                    .with_progress(0.4)
                    .connect_to("design", None),
            ),
            TaskNode::leaf(
                Task::new("Ship")
                    .with_actual("2024-03-25", "2024-03-25")
                    .connect_to("build", None),
            ),
        ],
    )]);

    // Terminal metrics: one line per row, no row separators.
    let mut state = GanttController::new(ControllerConfig::project().terminal());
    let columns = GridColumns::<3, GanttTree>::standard();
    let widget = GanttView::new(&tree, &TaskNameLabel, &columns, GanttViewStyle::default());

    let area = Rect::new(0, 0, 100, 8);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer, &mut state);

    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        println!("{}", line.trim_end());
    }
}
