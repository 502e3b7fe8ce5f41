use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

static DEFAULT_CONFIG_FILE: &str = "flipbook.toml";

static ENV_PREFIX: &str = "FLIPBOOK";

static DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:132.0) Gecko/20100101 Firefox/132.0";

static DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// 运行配置：代码默认值 < 配置文件 < `FLIPBOOK_*` 环境变量
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub user_agent: String,
    pub accept: String,
    /// AnyFlip 在线阅读器的根地址
    pub anyflip_host: String,
    /// FlipHTML5 在线阅读器的根地址
    pub fliphtml5_host: String,
    #[serde(default = "default_compress_pdf")]
    pub compress_pdf: bool,
}

fn default_compress_pdf() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            accept: DEFAULT_ACCEPT.to_owned(),
            anyflip_host: "https://online.anyflip.com/".to_owned(),
            fliphtml5_host: "https://online.fliphtml5.com/".to_owned(),
            compress_pdf: default_compress_pdf(),
        }
    }
}

impl Settings {
    /// 指定了配置文件时该文件必须存在，否则尝试读取工作目录下的 `flipbook.toml`
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();

        let file = match config_path {
            Some(path) => {
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml).required(true)
            }
            None => {
                config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml).required(false)
            }
        };

        config::Config::builder()
            .set_default("user_agent", defaults.user_agent)?
            .set_default("accept", defaults.accept)?
            .set_default("anyflip_host", defaults.anyflip_host)?
            .set_default("fliphtml5_host", defaults.fliphtml5_host)?
            .set_default("compress_pdf", defaults.compress_pdf)?
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("配置文件反序列化失败: {}", e))
    }
}
