use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = studio_api::Args::parse();

	studio_api::run(args).await
}
