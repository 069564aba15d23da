use app_freeze::app::config::load_config;
use app_freeze::app::logging::init_logging;
use app_freeze::app::ui::app;

fn main() {
    init_logging();
    let config = load_config();
    if let Err(message) = app::run(&config) {
        eprintln!("app-freeze: {message}");
        std::process::exit(1);
    }
}
