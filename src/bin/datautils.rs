use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    datautils::cli::run(std::env::args().skip(1))
}
