fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    explain_canvas::run_app()
}
