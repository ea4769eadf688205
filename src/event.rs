/// Events delivered from the tokio side back to the UI thread. The app
/// drains these every frame and feeds them into the controller.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ReplyReady { generation: u64, text: String },
}
