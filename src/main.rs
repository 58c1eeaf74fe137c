fn main() {
    std::process::exit(presswork::app::startup::startup());
}
