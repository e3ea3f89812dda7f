use std::io::BufRead;

use miette::IntoDiagnostic;

/// Lines read from `git`, decoded lossily.
///
/// File contents echoed by `git diff` and `git blame` are not necessarily UTF-8, so invalid
/// sequences are replaced rather than rejected.
pub struct LossyLines<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = miette::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer).into_diagnostic() {
            Ok(0) => None,
            Ok(_) => {
                let mut line = String::from_utf8_lossy(&self.buffer).into_owned();
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                tracing::trace!("{line}");
                Some(Ok(line))
            }
            Err(error) => Some(Err(error)),
        }
    }
}
