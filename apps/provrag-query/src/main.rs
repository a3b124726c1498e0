use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = provrag_query::Args::parse();

	provrag_query::run(args).await
}
