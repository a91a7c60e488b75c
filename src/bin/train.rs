fn main() -> Result<(), Box<dyn std::error::Error>> {
    shardsource::apps::run_train(std::env::args().skip(1))
}
