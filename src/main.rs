fn main() {
    monkey::cli::run();
}
