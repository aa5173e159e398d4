use dotenv::var;
use lcd1602::{BusyTimeoutPolicy, ModuleParams, PinMap, SessionOptions};
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "lcd1602.json";

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Pins {
    pub rs: usize,
    pub rw: usize,
    pub e: usize,
    /// D0 first.
    pub data: Vec<usize>,
}

impl From<Pins> for PinMap {
    fn from(pins: Pins) -> Self {
        PinMap {
            rs: pins.rs,
            rw: pins.rw,
            e: pins.e,
            data: pins.data,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub chip: String,
    pub pins: Pins,
    /// 7 or 10.
    pub font_size: u8,
    /// 1 or 2.
    pub line_no: u8,
    pub abort_on_busy_timeout: bool,
}

impl Config {
    fn path() -> String {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE));
        config_str.to_string_lossy().into_owned()
    }

    pub fn try_load() -> Option<Self> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = Self::path();
        let file = std::fs::File::create(Path::new(&config_str))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Module parameters, with `LCD1602_FONT_SIZE` and `LCD1602_LINE_NO` taking precedence over the file.
    pub fn module_params(&self) -> eyre::Result<ModuleParams> {
        self.module_params_with(var("LCD1602_FONT_SIZE").ok(), var("LCD1602_LINE_NO").ok())
    }

    fn module_params_with(&self, font_size: Option<String>, line_no: Option<String>) -> eyre::Result<ModuleParams> {
        Ok(ModuleParams {
            font_size: match font_size {
                Some(value) => value.trim().parse()?,
                None => self.font_size,
            },
            line_no: match line_no {
                Some(value) => value.trim().parse()?,
                None => self.line_no,
            },
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            busy_timeout: if self.abort_on_busy_timeout {
                BusyTimeoutPolicy::Abort
            } else {
                BusyTimeoutPolicy::Proceed
            },
            ..SessionOptions::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let params = ModuleParams::default();
        Config {
            chip: "/dev/gpiochip0".to_string(),
            pins: Pins {
                rs: 22,
                rw: 27,
                e: 17,
                data: vec![5, 6, 13, 19, 26, 16, 20, 21],
            },
            font_size: params.font_size,
            line_no: params.line_no,
            abort_on_busy_timeout: false,
        }
    }
}
