use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    tokmix::apps::run_dump_frequencies(std::env::args().skip(1))
}
