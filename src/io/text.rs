use std::io::{self, Write};
use std::str::{FromStr, SplitWhitespace};

use crate::error::{NnetError, Result};
use crate::math::matrix::Matrix;
use crate::registry::FunctionCode;

/// Pulls typed values out of a whitespace-delimited model stream.
pub struct TokenReader<'a> {
    tokens: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> TokenReader<'a> {
    pub fn new(text: &'a str) -> Self {
        TokenReader { tokens: text.split_whitespace(), position: 0 }
    }

    pub fn next_token(&mut self, field: &str) -> Result<&'a str> {
        let token = self.tokens.next().ok_or_else(|| {
            NnetError::format(format!(
                "stream ended at token {} while reading {}",
                self.position, field
            ))
        })?;
        self.position += 1;
        Ok(token)
    }

    fn parse<T: FromStr>(&mut self, field: &str) -> Result<T> {
        let token = self.next_token(field)?;
        token.parse().map_err(|_| {
            NnetError::format(format!(
                "cannot parse {:?} at token {} as {}",
                token,
                self.position - 1,
                field
            ))
        })
    }

    pub fn next_usize(&mut self, field: &str) -> Result<usize> {
        self.parse(field)
    }

    pub fn next_u32(&mut self, field: &str) -> Result<u32> {
        self.parse(field)
    }

    pub fn next_f64(&mut self, field: &str) -> Result<f64> {
        self.parse(field)
    }

    pub fn next_code<T: FunctionCode>(&mut self, field: &str) -> Result<T> {
        T::from_code(self.next_u32(field)?)
    }

    pub fn next_vec(&mut self, len: usize, field: &str) -> Result<Vec<f64>> {
        (0..len).map(|_| self.next_f64(field)).collect()
    }

    /// Reads `rows × cols` values in row-major order.
    pub fn next_matrix(&mut self, rows: usize, cols: usize, field: &str) -> Result<Matrix> {
        let data = (0..rows)
            .map(|_| self.next_vec(cols, field))
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix { rows, cols, data })
    }
}

/// Writes `v` on one line. `{}` on `f64` prints the shortest string that
/// parses back to the same value.
pub fn write_vec(out: &mut dyn Write, v: &[f64]) -> io::Result<()> {
    let line: Vec<String> = v.iter().map(|x| x.to_string()).collect();
    writeln!(out, "{}", line.join(" "))
}

/// Writes one matrix row per line.
pub fn write_matrix(out: &mut dyn Write, m: &Matrix) -> io::Result<()> {
    for row in &m.data {
        write_vec(out, row)?;
    }
    Ok(())
}
