use once_cell::sync::Lazy;

pub struct Config {
    pub api_key: String,

    pub bot_tokens: Vec<String>,
    pub dump_chat_id: i64,

    pub host: String,
    pub port: u16,

    pub sentry_dsn: String,
}

fn get_env(env: &'static str) -> String {
    std::env::var(env).unwrap_or_else(|_| panic!("Cannot get the {} env variable", env))
}

fn get_env_or(env: &'static str, default: &str) -> String {
    std::env::var(env).unwrap_or_else(|_| default.to_string())
}

fn parse_bot_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn load() -> Config {
        let bot_tokens = parse_bot_tokens(&get_env("BOT_TOKENS"));
        if bot_tokens.is_empty() {
            panic!("BOT_TOKENS must contain at least one token");
        }

        Config {
            api_key: get_env("API_KEY"),

            bot_tokens,
            dump_chat_id: get_env("DUMP_CHAT_ID")
                .parse()
                .unwrap_or_else(|_| panic!("DUMP_CHAT_ID must be an integer")),

            host: get_env_or("HOST", "0.0.0.0"),
            port: get_env_or("PORT", "8080")
                .parse()
                .unwrap_or_else(|_| panic!("PORT must be a valid port number")),

            sentry_dsn: get_env("SENTRY_DSN"),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);
