use cape_derive::cape_error;
use std::borrow::Cow;

#[cape_error]
pub enum ArchiveError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Entry {name} is missing{}", format_context(.context))]
    Missing { name: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open() -> Result<(), ArchiveError> {
    let io: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
    io.context("Opening archive")?;
    Ok(())
}

fn main() {
    let _ = open();
    let _: ArchiveError = "broken".into();
}
