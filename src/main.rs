use graph_lens::gui::frontend::GroupingApp;
use graph_lens::persistence::settings::AppSettings;
use graph_lens::service::directory::DirectoryDataService;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("settings unreadable, using defaults: {}", e);
        AppSettings::default()
    });
    let service = DirectoryDataService::new(settings.data_dir());
    log::info!("serving databases from {}", service.root().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            // Provide sensible bounds so the UI stays usable on small screens
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Graph-Lens",
        options,
        Box::new(move |cc| {
            let app = GroupingApp::new(settings, service, cc.egui_ctx.clone())?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    )
}
