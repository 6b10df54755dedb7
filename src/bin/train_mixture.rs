use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    tokmix::apps::run_train_mixture(std::env::args().skip(1))
}
