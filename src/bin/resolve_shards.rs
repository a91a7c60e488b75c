fn main() -> Result<(), Box<dyn std::error::Error>> {
    shardsource::apps::run_resolve_shards(std::env::args().skip(1))
}
