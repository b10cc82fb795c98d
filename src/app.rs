use clap::Arg;

pub struct App {
    input_path: String,
    output_path: Option<String>,
    conf_path: String,
    fund_type: Option<String>,
}

impl App {
    pub fn new() -> App {
        let matches = clap::App::new("fund-peps")
            .version("0.1.0")
            .about("Parses fund statements and computes FIFO (PEPS) gains per fund")
            .arg(Arg::with_name("input_path")
                .short("i")
                .long("input")
                .takes_value(true)
                .help("Statement to process (PDF or extracted text)"))
            .arg(Arg::with_name("output_path")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("Directory for the CSV reports"))
            .arg(Arg::with_name("config_path")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("Config file"))
            .arg(Arg::with_name("fund_type")
                .short("f")
                .long("fund-type")
                .takes_value(true)
                .help("Only report funds of this type, e.g. \"Money Market\""))
            .get_matches();

        App {
            input_path: matches.value_of("input_path")
                .unwrap_or("statement.pdf")
                .to_string(),
            output_path: matches.value_of("output_path").map(str::to_string),
            conf_path: matches.value_of("config_path")
                .unwrap_or("config.yaml")
                .to_string(),
            fund_type: matches.value_of("fund_type").map(str::to_string),
        }
    }

    pub fn get_config_path(&self) -> &str { &self.conf_path }
    pub fn get_input_path(&self) -> &str { &self.input_path }
    pub fn get_output_path(&self) -> Option<&str> { self.output_path.as_deref() }
    pub fn get_fund_type(&self) -> Option<&str> { self.fund_type.as_deref() }
}
