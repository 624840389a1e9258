//! Token sources.

use std::convert::Infallible;

/// A pull stream over an in-memory token sequence.
///
/// The stream goes forward only, but can be rewound to the first token.
#[derive(Debug, Clone)]
pub struct TokenStream<'a, T> {
    tokens: &'a [T],
    position: usize,
}

impl<'a, T> TokenStream<'a, T> {
    pub fn new(tokens: &'a [T]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Rewind to the first token.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// The number of tokens already pulled out.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> &'a [T] {
        &self.tokens[self.position..]
    }
}

impl<'a, T: Clone> Iterator for TokenStream<'a, T> {
    type Item = Result<T, Infallible>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(token))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.tokens.len() - self.position;
        (len, Some(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_can_be_rewound() {
        let tokens = [1, 2, 3];
        let mut stream = TokenStream::new(&tokens[..]);
        assert_eq!(stream.next(), Some(Ok(1)));
        assert_eq!(stream.next(), Some(Ok(2)));
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.remaining(), [3]);

        stream.reset();
        let all: Vec<_> = stream.by_ref().map(|t| t.unwrap()).collect();
        assert_eq!(all, [1, 2, 3]);
        assert_eq!(stream.next(), None);
        assert!(stream.remaining().is_empty());
    }
}
