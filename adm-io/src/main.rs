use std::fs::File;
use std::io::BufWriter;

use adm::config::Config;
use adm::container::{Container, ContainerSettings};
use adm::schema::Schema;
use adm::xml::output::IoSink;

fn main() {
    adm::init_logging();

    if let Err(error) = run() {
        log::error!("{:#}", error);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let input = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: adm-io <input.xml> [output.xml]"))?;

    // Build a container as configured...
    let settings = ContainerSettings::from_config(&Config::load("config/settings.yml")?);
    let buffer_size = settings.buffer_size;
    let preload = settings.common_definitions.is_some();
    let mut container = Container::new(Schema::load()?, settings);
    if preload {
        container.load_common_definitions()?;
    }

    log::info!("Reading {}...", input);
    container.read_file(input)?;

    let written = match args.get(2) {
        Some(output) => {
            log::info!("Writing {}...", output);
            let file = File::create(output)
                .map_err(|error| anyhow::anyhow!("Cannot create {}: {}", output, error))?;
            container.write(&mut IoSink::new(BufWriter::new(file), buffer_size))?
        }
        None => container.write(&mut IoSink::new(std::io::stdout().lock(), buffer_size))?,
    };

    log::info!("Wrote {} bytes.", written);
    Ok(())
}
