use std::fmt::Display;

/// Write a message to stderr.
///
/// Command output goes to stdout, everything addressed to the user goes
/// through here.
fn print_message(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::global();
        history.push_message(format!("{v}"));
    }

    eprintln!("{v}");
}

/// Write command output to stdout, verbatim.
pub(crate) fn output(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::output();
        history.push_message(format!("{v}"));
    }

    print!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("ERROR: {v}"));
}
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("WARNING: {v}"));
}
