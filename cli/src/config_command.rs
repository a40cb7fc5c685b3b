use estate_core::Config;

pub(crate) fn print_config(config: &Config) {
    println!("Current estate settings:");
    println!("--------------------------------");
    for (key, value) in config.summary_entries() {
        println!("{key}: {value}");
    }
    println!("--------------------------------");
    println!("* Override any key for one invocation with -c key=value. *");
}
