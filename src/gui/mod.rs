#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(config: crate::config::Config) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([680.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Mood-based Music Player",
        options,
        Box::new(move |cc| Ok(Box::new(app::MoodPlayerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("could not start the window: {e}"))
}
