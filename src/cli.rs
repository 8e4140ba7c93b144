use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask geospatial questions about India, or run GIS tools with slash commands", long_about = None)]
pub struct Args {
    /// Question or slash command to run once, e.g. "/geocode Jaipur"
    pub query: Option<String>,

    /// Start an interactive chat session
    #[arg(short, long)]
    pub chat: bool,

    /// AI provider to use [possible values: openai, openrouter, deepseek, gemini]
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the GIS server
    #[arg(long)]
    pub gis_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_query_with_overrides() {
        let args = Args::parse_from([
            "geochat",
            "/geocode Jaipur",
            "--provider",
            "deepseek",
            "--gis-url",
            "http://gis.local:5000",
        ]);
        assert_eq!(args.query.as_deref(), Some("/geocode Jaipur"));
        assert_eq!(args.provider.as_deref(), Some("deepseek"));
        assert_eq!(args.gis_url.as_deref(), Some("http://gis.local:5000"));
        assert!(!args.chat);
    }

    #[test]
    fn chat_flag_without_query() {
        let args = Args::parse_from(["geochat", "--chat"]);
        assert!(args.chat);
        assert!(args.query.is_none());
    }
}
