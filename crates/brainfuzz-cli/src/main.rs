mod command;
mod model;
mod oracle;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
