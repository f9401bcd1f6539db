use anyhow::Result;

fn main() -> Result<()> {
    let args = fileherd::cli::parse();
    fileherd::app::run(args)
}
