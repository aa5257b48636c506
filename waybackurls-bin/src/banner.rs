use std::io::{self, Write};

use clap::crate_version;

use crate::formatters::color::banner_style;

const BANNER: &str = r"
                          __                  __                 __
 _      __ ____ _ __  __ / /_   ____ _ _____ / /__ __  __ _____ / /_____
| | /| / // __  // / / // __ \ / __  // ___// //_// / / // ___// // ___/
| |/ |/ // /_/ // /_/ // /_/ // /_/ // /__ / ,<  / /_/ // /   / /(__  )
|__/|__/ \__,_/ \__, //_.___/ \__,_/ \___//_/|_| \__,_//_/   /_//____/
               /____/
";

/// Width the version line is right-aligned to
const BANNER_WIDTH: usize = 72;

/// The banner with the version line below it
fn banner() -> String {
    let version = format!("waybackurls v{}", crate_version!());
    format!("{BANNER}\n{version:>BANNER_WIDTH$}\n")
}

/// Print the banner to `err`, normally stderr
pub(crate) fn print_banner(err: &mut impl Write) -> io::Result<()> {
    writeln!(err, "{}", banner_style().apply_to(banner()))
}
