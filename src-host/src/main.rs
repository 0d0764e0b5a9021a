// Launched by the browser; stdin/stdout belong to the extension channel.

fn main() -> anyhow::Result<()> {
    igswap_host::run()
}
