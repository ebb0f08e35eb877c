#![forbid(unsafe_code)]

//! `ftcharset`: inspect charset resolution and conversion tables.

mod logging;

use std::env;
use std::error::Error;

use frankenterm_charset::{
    CodepageId, CodepageSession, EncodingConfig, FontPage, Glyph, PortableHost, Resolution,
    catalog, name_of, resolve, word,
};
use serde_json::{Value, json};

/// Name operands may be empty, meaning "use `FTERM_CHARSET`".
enum Command {
    List,
    Resolve { name: String },
    Table { name: String },
    Decode { name: String, bytes: Vec<u8> },
    Encode { name: String, text: String },
    Classify { text: String },
}

struct Config {
    command: Command,
    json: bool,
    verbose: bool,
    font_codepage: Option<CodepageId>,
    dbcs_font: bool,
}

fn print_usage() {
    eprintln!(
        "Usage: ftcharset [--json] [-v] <command>\n\
         \n\
         Commands:\n\
           list                                   list the named encodings\n\
           resolve [name]                         resolve an encoding name\n\
           table [name] [--font-codepage N] [--dbcs]\n\
                                                  dump the line table for <name>\n\
           decode <name> <hex-bytes>              decode bytes, e.g. \"c1 d2\"\n\
           encode <name> <text>                   encode text to bytes\n\
           classify <text>                        word class of each character\n\
         \n\
         An omitted or empty name means FTERM_CHARSET (or the locale default).\n\
         Names the tables cannot use fall back to the font codepage with a warning.\n\
         \n\
         Environment: FTERM_CHARSET, FTERM_FONT_CODEPAGE, FTERM_DBCS_FONT, FTERM_LOG"
    );
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    if digits.len() % 2 != 0 {
        return Err("hex bytes must have an even number of digits".to_string());
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex byte at offset {i}"))
        })
        .collect()
}

fn parse_args() -> Result<Config, String> {
    let mut args = env::args().skip(1);
    let mut json = false;
    let mut verbose = false;
    let mut font_codepage: Option<CodepageId> = None;
    let mut dbcs_font = false;
    let mut positional: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "-v" | "--verbose" => verbose = true,
            "--dbcs" => dbcs_font = true,
            "--font-codepage" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--font-codepage requires a value".to_string())?;
                font_codepage = Some(CodepageId::from_raw(
                    value
                        .parse::<i32>()
                        .map_err(|_| "invalid --font-codepage value".to_string())?,
                ));
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let verb = positional.next().ok_or_else(|| "missing command".to_string())?;
    let mut operand = |what: &str| {
        positional
            .next()
            .ok_or_else(|| format!("{verb} requires {what}"))
    };
    let command = match verb.as_str() {
        "list" => Command::List,
        "resolve" => Command::Resolve {
            name: operand("a name").unwrap_or_default(),
        },
        "table" => Command::Table {
            name: operand("a name").unwrap_or_default(),
        },
        "decode" => Command::Decode {
            name: operand("a name")?,
            bytes: parse_hex(&operand("hex bytes")?)?,
        },
        "encode" => Command::Encode {
            name: operand("a name")?,
            text: operand("text")?,
        },
        "classify" => Command::Classify {
            text: operand("text")?,
        },
        other => return Err(format!("unknown command {other:?}")),
    };

    Ok(Config {
        command,
        json,
        verbose,
        font_codepage,
        dbcs_font,
    })
}

fn describe_glyph(glyph: Glyph) -> String {
    match glyph {
        Glyph::Char(ch) => format!("U+{:04X}", u32::from(ch)),
        Glyph::DirectFont(FontPage::Ansi, index) => format!("font[{index:#04x}]"),
        Glyph::DirectFont(FontPage::Oem, index) => format!("oem[{index:#04x}]"),
        Glyph::DirectChar(set, byte) => format!("{set:?}[{byte:#04x}]"),
    }
}

fn printable(ch: char) -> String {
    if ch.is_control() {
        format!("\\u{{{:x}}}", u32::from(ch))
    } else {
        ch.to_string()
    }
}

fn emit(json: bool, value: &Value, text: impl FnOnce() -> String) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// `name` unless empty, else the configured charset.
fn charset_name<'a>(name: &'a str, encoding: &'a EncodingConfig) -> &'a str {
    if name.trim().is_empty() {
        &encoding.charset
    } else {
        name
    }
}

/// Build a session for `name` the way a terminal would, falling back to the
/// font codepage when the name is unusable.
fn open_session(
    host: PortableHost,
    encoding: &EncodingConfig,
    name: &str,
) -> (CodepageSession<PortableHost>, Resolution) {
    let config = encoding.clone().with_charset(charset_name(name, encoding));
    let (session, resolution) = CodepageSession::open(host, &config);
    if let Some(error) = &resolution.error {
        eprintln!("ftcharset warning: {error}; using {}", resolution.active);
    }
    (session, resolution)
}

fn run(cfg: Config) -> Result<(), Box<dyn Error>> {
    if !logging::init(cfg.verbose) {
        eprintln!("ftcharset warning: a tracing subscriber was already installed");
    }

    let host = PortableHost::from_env();
    let mut encoding = EncodingConfig::from_env()?;
    if let Some(codepage) = cfg.font_codepage {
        encoding = encoding.with_font_codepage(codepage);
    }
    if cfg.dbcs_font {
        encoding = encoding.with_dbcs_font(true);
    }
    tracing::debug!(
        font = encoding.font_codepage.raw(),
        dbcs_font = encoding.dbcs_font,
        "ftcharset configuration"
    );

    match cfg.command {
        Command::List => {
            let entries: Vec<Value> = catalog::entries()
                .map(|(index, entry)| {
                    json!({
                        "index": index,
                        "name": entry.name,
                        "builtin": entry.is_builtin(),
                        "os_codepage": entry.os_codepage,
                    })
                })
                .collect();
            emit(cfg.json, &Value::from(entries), || {
                catalog::entries()
                    .map(|(index, entry)| format!("{index:>3}  {}\n", entry.name))
                    .collect()
            })
        }
        Command::Resolve { name } => {
            let name = charset_name(&name, &encoding).to_owned();
            let id = resolve(&host, &name)?;
            let canonical = name_of(id);
            let value = json!({ "name": name, "id": id, "canonical": canonical });
            emit(cfg.json, &value, || format!("{} {canonical}\n", id.raw()))
        }
        Command::Table { name } => {
            let (session, resolution) = open_session(host, &encoding, &name);
            let tables = session.tables();
            let rows: Vec<Value> = (0..=0xFF_u8)
                .map(|byte| {
                    let slot = tables.line()[usize::from(byte)];
                    json!({
                        "byte": byte,
                        "slot": describe_glyph(slot),
                        "char": tables.resolve_glyph(slot).as_char().map(printable),
                        "control": tables.is_control(byte),
                    })
                })
                .collect();
            let value = json!({
                "error": resolution.error.as_ref().map(ToString::to_string),
                "font_codepage": tables.font_codepage(),
                "line_codepage": tables.line_codepage(),
                "direct_to_font": tables.is_direct_to_font(),
                "reverse_buckets": tables.reverse().map_or(0, |r| r.bucket_count()),
                "line": rows,
            });
            emit(cfg.json, &value, || {
                let mut out = format!(
                    "font {} line {} direct-to-font {}\n",
                    tables.font_codepage(),
                    tables.line_codepage(),
                    tables.is_direct_to_font()
                );
                for byte in 0..=0xFF_u8 {
                    let slot = tables.line()[usize::from(byte)];
                    let shown = tables
                        .resolve_glyph(slot)
                        .as_char()
                        .map(printable)
                        .unwrap_or_default();
                    let control = if tables.is_control(byte) { " ctl" } else { "" };
                    out.push_str(&format!(
                        "{byte:#04x}  {:<12} {shown}{control}\n",
                        describe_glyph(slot)
                    ));
                }
                out
            })
        }
        Command::Decode { name, bytes } => {
            let (session, resolution) = open_session(host, &encoding, &name);
            let codepage = resolution.active;
            let chars = session.decode(codepage, &bytes);
            let text: String = chars.iter().collect();
            let points: Vec<u32> = chars.iter().map(|&ch| u32::from(ch)).collect();
            let value = json!({ "codepage": codepage, "text": text, "code_points": points });
            emit(cfg.json, &value, || format!("{text}\n"))
        }
        Command::Encode { name, text } => {
            let (session, resolution) = open_session(host, &encoding, &name);
            let codepage = resolution.active;
            let chars: Vec<char> = text.chars().collect();
            let bytes = session.encode(codepage, &chars);
            let value = json!({ "codepage": codepage, "bytes": bytes });
            emit(cfg.json, &value, || {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
                format!("{}\n", hex.join(" "))
            })
        }
        Command::Classify { text } => {
            let classes: Vec<Value> = text
                .chars()
                .map(|ch| json!({ "char": printable(ch), "class": word::classify(ch) }))
                .collect();
            emit(cfg.json, &Value::from(classes), || {
                text.chars()
                    .map(|ch| format!("{}\t{}\n", printable(ch), word::classify(ch).as_str()))
                    .collect()
            })
        }
    }
}

fn main() {
    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            print_usage();
            eprintln!("ftcharset error: {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cfg) {
        eprintln!("ftcharset error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_spaces_and_prefix() {
        assert_eq!(parse_hex("c1 d2").unwrap(), vec![0xC1, 0xD2]);
        assert_eq!(parse_hex("0x4142").unwrap(), vec![0x41, 0x42]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn hex_rejects_odd_and_invalid() {
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn empty_name_uses_configured_charset() {
        let encoding = EncodingConfig::default().with_charset("KOI8-U");
        assert_eq!(charset_name("", &encoding), "KOI8-U");
        assert_eq!(charset_name("  ", &encoding), "KOI8-U");
        assert_eq!(charset_name("UTF-8", &encoding), "UTF-8");
    }

    #[test]
    fn multi_byte_name_shows_direct_font_table() {
        let encoding = EncodingConfig::default()
            .with_font_codepage(CodepageId::os(932))
            .with_dbcs_font(true);
        let (session, resolution) = open_session(PortableHost::new(932, 437), &encoding, "cp932");
        assert_eq!(resolution.error.as_ref().map(|e| e.code()), Some(-3));
        assert_eq!(resolution.active, CodepageId::os(932));
        let tables = session.tables();
        assert!(tables.is_direct_to_font());
        assert_eq!(tables.line()[65], Glyph::font(65));
    }

    #[test]
    fn configured_charset_drives_conversion() {
        let encoding = EncodingConfig::default().with_charset("KOI8-U");
        let (session, resolution) = open_session(PortableHost::default(), &encoding, "");
        assert!(resolution.is_ok());
        assert_eq!(name_of(resolution.active), "KOI8-U");
        assert_eq!(session.decode(resolution.active, &[0xC1]), vec!['а']);
    }

    #[test]
    fn second_logging_install_is_reported() {
        let _ = logging::init(false);
        assert!(!logging::init(false));
    }

    #[test]
    fn glyph_descriptions() {
        assert_eq!(describe_glyph(Glyph::Char('A')), "U+0041");
        assert_eq!(describe_glyph(Glyph::font(0x41)), "font[0x41]");
        assert_eq!(describe_glyph(Glyph::oem(0x5c)), "oem[0x5c]");
        assert_eq!(printable('\u{1b}'), "\\u{1b}");
    }
}
