//! Terminal rendering of streamed answers

use std::future::Future;
use std::io::{self, Write};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

/// How a rendered answer ended
#[derive(Debug, PartialEq, Eq)]
pub struct Rendered {
    /// Last text shown
    pub text: String,
    /// The user stopped the stream before it finished
    pub interrupted: bool,
}

/// Redraws a growing answer by writing only what is new.
///
/// When a partial does not extend what is already on screen it is written on
/// a fresh line in full.
pub struct PartialRenderer<W: Write> {
    out: W,
    shown: String,
}

impl<W: Write> PartialRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: String::new(),
        }
    }

    pub fn render(&mut self, partial: &str) -> io::Result<()> {
        match partial.strip_prefix(self.shown.as_str()) {
            Some(suffix) => self.out.write_all(suffix.as_bytes())?,
            None => {
                writeln!(self.out)?;
                self.out.write_all(partial.as_bytes())?;
            }
        }
        self.out.flush()?;
        self.shown = partial.to_string();
        Ok(())
    }

    /// End the answer line and return the final text
    pub fn finish(&mut self) -> io::Result<String> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(std::mem::take(&mut self.shown))
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// Render every partial until the stream ends or `interrupt` resolves.
///
/// Returning drops the stream, which closes the underlying connection.
pub async fn render_stream<S, W, F>(
    mut partials: S,
    renderer: &mut PartialRenderer<W>,
    interrupt: F,
) -> io::Result<Rendered>
where
    S: Stream<Item = String> + Unpin,
    W: Write,
    F: Future,
{
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            next = partials.next() => match next {
                Some(partial) => renderer.render(&partial)?,
                None => break,
            },
            _ = &mut interrupt => {
                interrupted = true;
                break;
            }
        }
    }

    let text = renderer.finish()?;
    Ok(Rendered { text, interrupted })
}

/// Read stdin lines on a plain thread so the prompt can also watch for Ctrl-C.
///
/// The channel closes at end of input.
pub fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Next input line, or `None` at end of input or when `interrupt` resolves
pub async fn next_line<F: Future>(
    lines: &mut mpsc::UnboundedReceiver<String>,
    interrupt: F,
) -> Option<String> {
    tokio::select! {
        line = lines.recv() => line,
        _ = interrupt => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(renderer: PartialRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_writes_only_new_suffix() {
        let mut renderer = PartialRenderer::new(Vec::new());
        for partial in ["Hola", "Hola, ", "Hola, mundo"] {
            renderer.render(partial).unwrap();
        }
        assert_eq!(renderer.finish().unwrap(), "Hola, mundo");
        assert_eq!(output(renderer), "Hola, mundo\n");
    }

    #[test]
    fn test_replacement_starts_fresh_line() {
        let mut renderer = PartialRenderer::new(Vec::new());
        renderer.render("Hola").unwrap();
        renderer.render("❌ Error: boom").unwrap();
        assert_eq!(renderer.finish().unwrap(), "❌ Error: boom");
        assert_eq!(output(renderer), "Hola\n❌ Error: boom\n");
    }

    #[tokio::test]
    async fn test_next_line_returns_input() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send("/help\n".to_string()).unwrap();
        let line = next_line(&mut rx, std::future::pending::<()>()).await;
        assert_eq!(line.as_deref(), Some("/help\n"));
    }

    #[tokio::test]
    async fn test_next_line_ends_on_interrupt() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<String>();
        assert_eq!(next_line(&mut rx, std::future::ready(())).await, None);
    }

    #[tokio::test]
    async fn test_next_line_ends_at_eof() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        assert_eq!(next_line(&mut rx, std::future::pending::<()>()).await, None);
    }

    #[tokio::test]
    async fn test_render_stream_to_end() {
        let partials = futures::stream::iter(vec!["¿Qué".to_string(), "¿Qué opinas?".to_string()]);
        let mut renderer = PartialRenderer::new(Vec::new());
        let rendered = render_stream(partials, &mut renderer, std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(
            rendered,
            Rendered {
                text: "¿Qué opinas?".into(),
                interrupted: false
            }
        );
        assert_eq!(output(renderer), "¿Qué opinas?\n");
    }

    #[tokio::test]
    async fn test_render_stream_interrupted() {
        let partials = futures::stream::iter(vec!["Hola".to_string()])
            .chain(futures::stream::pending());
        let mut renderer = PartialRenderer::new(Vec::new());
        let rendered = render_stream(
            Box::pin(partials),
            &mut renderer,
            tokio::time::sleep(std::time::Duration::from_millis(10)),
        )
        .await
        .unwrap();
        assert!(rendered.interrupted);
        assert_eq!(rendered.text, "Hola");
    }
}
