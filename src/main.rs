//! # promptslip CLI
//!
//! Command-line interface for printing photos with conversation prompts.
//!
//! ## Usage
//!
//! ```bash
//! # Run the web interface against a USB printer
//! promptslip serve --printer usb
//!
//! # Run it with the dummy printer, saving ESC/POS to output.escpos
//! promptslip serve --printer dummy
//!
//! # Print a photo with custom text
//! promptslip print photo.jpg --text "What does this remind you of?"
//!
//! # Print generated topics only
//! OPENAI_API_KEY=... promptslip print --hint "make them about travel"
//!
//! # Preview the dithered photo as PNG
//! promptslip preview photo.jpg -o preview.png
//!
//! # Show what the printer would receive for some text
//! echo "café — ½ price" | promptslip sanitize
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use promptslip::{
    PromptslipError,
    job::{self, JobOptions, PrintJob},
    printer::PrinterConfig,
    render::{
        banner,
        normalize::{self, NormalizeOptions, OrientationPolicy},
    },
    sanitize::sanitize,
    server::{self, ServerConfig},
    sink::{self, DEFAULT_DUMMY_OUTPUT, SinkConfig},
    topics::{FALLBACK_TOPICS, OpenAiConfig, OpenAiTopicSource, StaticTopicSource, TopicSource},
    transport::device::{DEFAULT_BAUD, DEFAULT_DEVICE},
};

/// promptslip - Conversation prompts on receipt paper
#[derive(Parser, Debug)]
#[command(name = "promptslip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP interface
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        listen: String,

        /// Seconds a rendered banner stays available
        #[arg(long, default_value_t = server::BANNER_TTL_SECS)]
        banner_ttl: u64,

        #[command(flatten)]
        printer: PrinterArgs,

        #[command(flatten)]
        topics: TopicArgs,
    },

    /// Print an image and/or text once
    Print {
        /// JPEG or PNG to print above the text
        image: Option<PathBuf>,

        /// Text to print (omit to generate conversation topics)
        #[arg(long)]
        text: Option<String>,

        /// Extra instructions for topic generation
        #[arg(long)]
        hint: Option<String>,

        #[command(flatten)]
        printer: PrinterArgs,

        #[command(flatten)]
        topics: TopicArgs,
    },

    /// Save the printable version of an image (or banner) as PNG
    Preview {
        /// JPEG or PNG input
        #[arg(required_unless_present = "banner")]
        image: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,

        /// Render this text as a banner instead of an image
        #[arg(long, conflicts_with = "image")]
        banner: Option<String>,

        /// Paper profile or width in dots: 80mm, 58mm, or a number
        #[arg(long, default_value = "80mm", value_parser = PrinterConfig::parse)]
        paper: PrinterConfig,

        /// Orientation correction: none, exif, portrait
        #[arg(long, default_value = "exif", value_parser = OrientationPolicy::parse)]
        orientation: OrientationPolicy,
    },

    /// Sanitize stdin (or the given text) and print the result
    Sanitize {
        text: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PrinterKind {
    /// In-memory printer; output saved to --output
    Dummy,
    /// Device node (usblp or serial)
    Device,
    /// Raw USB via libusb
    #[cfg(feature = "usb")]
    Usb,
}

#[derive(Args, Debug)]
struct PrinterArgs {
    /// Printer backend
    #[arg(long, value_enum, default_value = "device", env = "PROMPTSLIP_PRINTER")]
    printer: PrinterKind,

    /// Printer device path
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Baud rate for serial printers (ignored for non-tty devices)
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// USB vendor:product id in hex, e.g. 0fe6:811e (auto-detected if omitted)
    #[cfg(feature = "usb")]
    #[arg(long, value_parser = promptslip::transport::usb::UsbId::parse)]
    usb_id: Option<promptslip::transport::usb::UsbId>,

    /// Where the dummy printer saves ESC/POS output
    #[arg(long, default_value = DEFAULT_DUMMY_OUTPUT)]
    output: PathBuf,

    /// Paper profile or width in dots: 80mm, 58mm, or a number
    #[arg(long, default_value = "80mm", value_parser = PrinterConfig::parse)]
    paper: PrinterConfig,

    /// Orientation correction: none, exif, portrait
    #[arg(long, default_value = "exif", value_parser = OrientationPolicy::parse)]
    orientation: OrientationPolicy,

    /// Times each job is printed
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=20))]
    copies: u32,
}

impl PrinterArgs {
    fn sink_config(&self) -> SinkConfig {
        match self.printer {
            PrinterKind::Dummy => SinkConfig::Dummy {
                output: Some(self.output.clone()),
            },
            PrinterKind::Device => SinkConfig::Device {
                path: self.device.clone(),
                baud: Some(self.baud),
            },
            #[cfg(feature = "usb")]
            PrinterKind::Usb => SinkConfig::Usb { id: self.usb_id },
        }
    }

    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            orientation: self.orientation,
            ..NormalizeOptions::for_printer(&self.paper)
        }
    }

    fn job_options(&self) -> JobOptions {
        JobOptions {
            width: self.paper.width_dots,
            copies: self.copies,
        }
    }
}

#[derive(Args, Debug)]
struct TopicArgs {
    /// OpenAI API key (without it, a fixed set of topics is printed)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Chat model for topic generation
    #[arg(long, env = "OPENAI_MODEL", default_value = promptslip::topics::openai::DEFAULT_MODEL)]
    model: String,

    /// API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = promptslip::topics::openai::DEFAULT_BASE_URL)]
    api_base_url: String,
}

impl TopicArgs {
    fn source(&self) -> Result<Arc<dyn TopicSource>, PromptslipError> {
        if self.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set, using fixed conversation topics");
            return Ok(Arc::new(StaticTopicSource::default()));
        }

        let source = OpenAiTopicSource::new(OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            model: self.model.clone(),
            base_url: self.api_base_url.clone(),
            ..OpenAiConfig::default()
        })?;
        Ok(Arc::new(source))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("promptslip=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PromptslipError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            banner_ttl,
            printer,
            topics,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                sink: printer.sink_config(),
                printer: printer.paper,
                normalize: printer.normalize_options(),
                copies: printer.copies,
                banner_ttl: Duration::from_secs(banner_ttl),
                ..ServerConfig::default()
            };
            let source = topics.source()?;
            runtime()?.block_on(server::serve(config, source))
        }

        Commands::Print {
            image,
            text,
            hint,
            printer,
            topics,
        } => {
            let bitmap = image
                .as_deref()
                .map(|path| load_image(path, &printer.normalize_options()))
                .transpose()?;

            let text = match text.filter(|t| !t.trim().is_empty()) {
                Some(text) => text,
                None => {
                    let source = topics.source()?;
                    runtime()?
                        .block_on(source.generate_topics(hint.as_deref(), None))
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "Using fallback topics");
                            FALLBACK_TOPICS.to_string()
                        })
                }
            };

            let sink_config = printer.sink_config();
            info!(sink = %sink_config.describe(), "Printing");
            let mut printer_sink = sink::open_sink(&sink_config, printer.paper)?;
            job::execute(
                &mut *printer_sink,
                &PrintJob::new(bitmap, text),
                &printer.job_options(),
            )?;
            if let Some(path) = sink::persist_capture(&*printer_sink, &sink_config)? {
                println!("ESC/POS bytes saved to {}", path.display());
            } else {
                println!("Printed successfully!");
            }
            Ok(())
        }

        Commands::Preview {
            image,
            output,
            banner: banner_text,
            paper,
            orientation,
        } => {
            let bitmap = match (banner_text, image) {
                (Some(text), _) => banner::render_banner(&text, paper.width_dots)?,
                (None, Some(path)) => {
                    let options = NormalizeOptions {
                        orientation,
                        ..NormalizeOptions::for_printer(&paper)
                    };
                    load_image(&path, &options)?
                }
                (None, None) => {
                    return Err(PromptslipError::Config(
                        "An image or --banner is required".to_string(),
                    ));
                }
            };

            std::fs::write(&output, bitmap.to_png()?)?;
            println!(
                "Saved {}x{} preview to {}",
                bitmap.width(),
                bitmap.height(),
                output.display()
            );
            Ok(())
        }

        Commands::Sanitize { text } => {
            let input = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            print!("{}", sanitize(&input));
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, PromptslipError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(PromptslipError::from)
}

/// Read and normalize an image file, taking its content type from the
/// extension the way an upload would declare it.
fn load_image(
    path: &Path,
    options: &NormalizeOptions,
) -> Result<promptslip::render::Bitmap, PromptslipError> {
    let content_type = mime_guess::from_path(path).first_raw();
    let bytes = std::fs::read(path).map_err(|e| {
        PromptslipError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    normalize::prepare_upload(&bytes, content_type, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer_args(args: &[&str]) -> PrinterArgs {
        let argv = ["promptslip", "print"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Print { printer, .. } => printer,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_device_defaults_to_9600_baud() {
        let args = printer_args(&["--printer", "device"]);
        assert_eq!(
            args.sink_config(),
            SinkConfig::Device {
                path: PathBuf::from(DEFAULT_DEVICE),
                baud: Some(9600),
            }
        );
    }

    #[test]
    fn test_explicit_baud() {
        let args = printer_args(&["--printer", "device", "--device", "/dev/ttyUSB0", "--baud", "19200"]);
        assert_eq!(
            args.sink_config(),
            SinkConfig::Device {
                path: PathBuf::from("/dev/ttyUSB0"),
                baud: Some(19200),
            }
        );
    }

    #[test]
    fn test_paper_width_limit() {
        assert!(Cli::try_parse_from(["promptslip", "print", "--paper", "600000"]).is_err());
    }
}
