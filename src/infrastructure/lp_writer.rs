//! CPLEX LP text rendering of a loaded [`LinearProgram`].
//!
//! The output has the usual sections (`Minimize`, `Subject To`, `Bounds`,
//! `Generals`, `End`). Values at or beyond the backend's infinity are written
//! as `inf` / `-inf`.

use crate::domain::{LinearProgram, ModelNames, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const TERMS_PER_LINE: usize = 8;

/// Render `program` into `path`
pub fn write_lp_file(
    path: &Path,
    program: &LinearProgram,
    names: &ModelNames,
    infinity: f64,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lp(&mut out, program, names, infinity)?;
    out.flush()?;
    Ok(())
}

pub fn write_lp<W: Write>(
    out: &mut W,
    program: &LinearProgram,
    names: &ModelNames,
    infinity: f64,
) -> io::Result<()> {
    writeln!(out, "\\ Problem written by milpfacade")?;
    writeln!(out, "Minimize")?;
    let objective: Vec<(usize, f64)> = program.objective.iter().copied().enumerate().collect();
    writeln!(out, " obj: {}", expression(&objective, &names.cols))?;

    writeln!(out, "Subject To")?;
    for (row, entries) in program.rows().iter().enumerate() {
        let expr = expression(entries, &names.cols);
        let lower = program.row_lower[row];
        let upper = program.row_upper[row];
        let name = &names.rows[row];
        match (is_neg_inf(lower, infinity), is_pos_inf(upper, infinity)) {
            (true, true) => writeln!(out, " {}: {} >= -inf", name, expr)?,
            (true, false) => writeln!(out, " {}: {} <= {}", name, expr, upper)?,
            (false, true) => writeln!(out, " {}: {} >= {}", name, expr, lower)?,
            (false, false) if lower == upper => writeln!(out, " {}: {} = {}", name, expr, lower)?,
            (false, false) => writeln!(out, " {}: {} <= {} <= {}", name, lower, expr, upper)?,
        }
    }

    writeln!(out, "Bounds")?;
    for (col, name) in names.cols.iter().enumerate() {
        if let Some(line) = bound_line(name, program.col_lower[col], program.col_upper[col], infinity) {
            out.write_all(line.as_bytes())?;
        }
    }

    if program.num_integers() > 0 {
        writeln!(out, "Generals")?;
        for (col, _) in program.integer.iter().enumerate().filter(|(_, is_int)| **is_int) {
            writeln!(out, " {}", names.cols[col])?;
        }
    }

    writeln!(out, "End")
}

fn bound_line(name: &str, lower: f64, upper: f64, infinity: f64) -> Option<String> {
    let line = match (is_neg_inf(lower, infinity), is_pos_inf(upper, infinity)) {
        (true, true) => format!(" {} free\n", name),
        (true, false) => format!(" -inf <= {} <= {}\n", name, upper),
        // [0, inf) is the format's default
        (false, true) if lower == 0.0 => return None,
        (false, true) => format!(" {} >= {}\n", name, lower),
        (false, false) if lower == upper => format!(" {} = {}\n", name, lower),
        (false, false) => format!(" {} <= {} <= {}\n", lower, name, upper),
    };
    Some(line)
}

fn expression(entries: &[(usize, f64)], col_names: &[String]) -> String {
    let mut expr = String::new();
    let mut written = 0;

    for &(col, coeff) in entries {
        if coeff == 0.0 {
            continue;
        }
        let Some(name) = col_names.get(col) else {
            continue;
        };
        if written > 0 && written % TERMS_PER_LINE == 0 {
            expr.push_str("\n  ");
        }
        let sign = match (written, coeff < 0.0) {
            (0, false) => "",
            (0, true) => "- ",
            (_, false) => " + ",
            (_, true) => " - ",
        };
        let magnitude = coeff.abs();
        expr.push_str(sign);
        if magnitude != 1.0 {
            expr.push_str(&format!("{} ", magnitude));
        }
        expr.push_str(name);
        written += 1;
    }

    if written == 0 {
        expr = match col_names.first() {
            Some(name) => format!("0 {}", name),
            None => "0".to_string(),
        };
    }
    expr
}

fn is_pos_inf(value: f64, infinity: f64) -> bool {
    value >= infinity || value == f64::INFINITY
}

fn is_neg_inf(value: f64, infinity: f64) -> bool {
    value <= -infinity || value == f64::NEG_INFINITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnMatrix, RangeProblem};

    fn render(program: &LinearProgram, names: &ModelNames, infinity: f64) -> String {
        let mut out = Vec::new();
        write_lp(&mut out, program, names, infinity).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Accepts `capacity` bytes, then fails every write
    struct ShortSink {
        capacity: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.capacity == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
            }
            let n = buf.len().min(self.capacity);
            self.capacity -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn program() -> LinearProgram {
        // min -x - 2y  s.t.  x + y <= 10,  1 <= x - 3y <= 4,  y = 2 (as a row)
        let starts = [0, 2, 5];
        let indices = [0, 1, 0, 1, 2];
        let values = [1.0, 1.0, 1.0, -3.0, 1.0];
        let lp = LinearProgram::from_ranges(&RangeProblem {
            matrix: ColumnMatrix::new(3, &starts, &indices, &values),
            col_lower: &[0.0, -5.0],
            col_upper: &[f64::MAX, 7.0],
            objective: &[-1.0, -2.0],
            row_lower: &[-f64::MAX, 1.0, 2.0],
            row_upper: &[10.0, 4.0, 2.0],
            integer: &[false, true],
        })
        .unwrap();
        lp
    }

    #[test]
    fn test_render_full_model() {
        let lp = program();
        let names = ModelNames::resolve(2, 3, None, None).unwrap();
        let text = render(&lp, &names, f64::MAX);
        let expected = "\\ Problem written by milpfacade\n\
                        Minimize\n \
                        obj: - x0 - 2 x1\n\
                        Subject To\n \
                        R0: x0 + x1 <= 10\n \
                        R1: 1 <= x0 - 3 x1 <= 4\n \
                        R2: x1 = 2\n\
                        Bounds\n \
                        -5 <= x1 <= 7\n\
                        Generals\n \
                        x1\n\
                        End\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_uses_given_names() {
        let lp = program();
        let names =
            ModelNames::resolve(2, 3, Some(&["apples", "pears"][..]), Some(&["budget"][..]))
                .unwrap();
        let text = render(&lp, &names, f64::MAX);
        assert!(text.contains(" obj: - apples - 2 pears\n"));
        assert!(text.contains(" budget: apples + pears <= 10\n"));
        assert!(text.contains(" R1: 1 <= apples - 3 pears <= 4\n"));
        assert!(text.contains("Generals\n pears\n"));
    }

    #[test]
    fn test_bound_lines() {
        let inf = f64::INFINITY;
        assert_eq!(bound_line("x", 0.0, inf, inf), None);
        assert_eq!(bound_line("x", -inf, inf, inf).unwrap(), " x free\n");
        assert_eq!(bound_line("x", 2.5, inf, inf).unwrap(), " x >= 2.5\n");
        assert_eq!(bound_line("x", -inf, 3.0, inf).unwrap(), " -inf <= x <= 3\n");
        assert_eq!(bound_line("x", 4.0, 4.0, inf).unwrap(), " x = 4\n");
        assert_eq!(bound_line("x", 0.0, 1.0, inf).unwrap(), " 0 <= x <= 1\n");
        // anything at the backend sentinel counts as unbounded
        assert_eq!(bound_line("x", -1e30, 1e30, 1e30).unwrap(), " x free\n");
    }

    #[test]
    fn test_expression_wraps_long_rows() {
        let names: Vec<String> = (0..10).map(|i| format!("v{}", i)).collect();
        let entries: Vec<(usize, f64)> = (0..10).map(|i| (i, 1.0)).collect();
        let expr = expression(&entries, &names);
        assert_eq!(
            expr,
            "v0 + v1 + v2 + v3 + v4 + v5 + v6 + v7\n   + v8 + v9"
        );
    }

    #[test]
    fn test_expression_skips_zeros_and_handles_empty() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(expression(&[(0, 0.0), (1, -0.5)], &names), "- 0.5 b");
        assert_eq!(expression(&[], &names), "0 a");
        assert_eq!(expression(&[], &[]), "0");
    }

    #[test]
    fn test_free_row() {
        let starts = [0, 1];
        let lp = LinearProgram::from_ranges(&RangeProblem {
            matrix: ColumnMatrix::new(1, &starts, &[0], &[2.0]),
            col_lower: &[0.0],
            col_upper: &[f64::INFINITY],
            objective: &[1.0],
            row_lower: &[f64::NEG_INFINITY],
            row_upper: &[f64::INFINITY],
            integer: &[false],
        })
        .unwrap();
        let names = ModelNames::resolve(1, 1, None, None).unwrap();
        let text = render(&lp, &names, f64::INFINITY);
        assert!(text.contains(" R0: 2 x0 >= -inf\n"));
        assert!(!text.contains("Generals"));
    }

    #[test]
    fn test_write_errors_propagate() {
        let lp = program();
        let names = ModelNames::resolve(2, 3, None, None).unwrap();
        for capacity in [0, 40, 120] {
            let mut sink = ShortSink { capacity };
            let err = write_lp(&mut sink, &lp, &names, f64::MAX).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        }
    }

    #[test]
    fn test_write_lp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.lp");
        let lp = program();
        let names = ModelNames::resolve(2, 3, None, None).unwrap();
        write_lp_file(&path, &lp, &names, f64::MAX).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("\\ Problem written by milpfacade\nMinimize\n"));
        assert!(text.ends_with("End\n"));
    }
}
