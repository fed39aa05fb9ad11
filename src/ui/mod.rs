/// UI widgets that are more than plain iced composition
///
/// - canvas.rs: the interactive poster canvas (zoom/pan)

pub mod canvas;
