//! Balanced line breaking for short descriptive text.

/// Split at spaces and after hyphens, keeping the delimiter on the left part.
pub fn split_into_words(line: &str) -> Vec<String> {
    let mut words = vec![line.to_string()];
    for delimiter in [' ', '-'] {
        words = words
            .iter()
            .flat_map(|w| split_keep_delimiter(w, delimiter))
            .collect();
    }
    words
}

fn split_keep_delimiter(text: &str, delimiter: char) -> Vec<String> {
    let parts: Vec<&str> = text.split(delimiter).collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i < last {
                format!("{part}{delimiter}")
            } else {
                part.to_string()
            }
        })
        .collect()
}

fn join(words: &[String]) -> String {
    words.concat().trim().to_string()
}

/// Break `line` into the fewest lines that each fit `max_width`, choosing among those the split
/// whose widest line is narrowest. Falls back to one word per line when nothing fits.
pub fn split_evenly<F, E>(line: &str, mut measure: F, max_width: f64) -> Result<Vec<String>, E>
where
    F: FnMut(&str) -> Result<f64, E>,
{
    let words = split_into_words(line);
    let mut nb_lines = 1;
    loop {
        if nb_lines >= words.len() {
            return Ok(words.iter().map(|w| w.trim().to_string()).collect());
        }
        let mut search = Search {
            words: &words,
            max_width,
            measure: &mut measure,
            best: None,
            cuts: Vec::with_capacity(nb_lines),
        };
        search.run(0, nb_lines)?;
        if let Some((_, cuts)) = search.best {
            let mut lines = Vec::with_capacity(cuts.len());
            let mut start = 0;
            for end in cuts {
                lines.push(join(&words[start..end]));
                start = end;
            }
            return Ok(lines);
        }
        nb_lines += 1;
    }
}

struct Search<'a, F> {
    words: &'a [String],
    max_width: f64,
    measure: &'a mut F,
    /// Widest line of the best split so far, with its end indices.
    best: Option<(f64, Vec<usize>)>,
    cuts: Vec<usize>,
}

impl<F, E> Search<'_, F>
where
    F: FnMut(&str) -> Result<f64, E>,
{
    fn limit(&self) -> f64 {
        self.best
            .as_ref()
            .map_or(self.max_width, |(w, _)| w.min(self.max_width))
    }

    fn fits(&mut self, start: usize, end: usize) -> Result<Option<f64>, E> {
        let width = (self.measure)(&join(&self.words[start..end]))?;
        Ok((width <= self.limit()).then_some(width))
    }

    fn run(&mut self, start: usize, remaining: usize) -> Result<(), E> {
        let n = self.words.len();
        if remaining > n - start {
            return Ok(());
        }
        if remaining == 1 {
            if self.fits(start, n)?.is_none() {
                return Ok(());
            }
            self.cuts.push(n);
            let mut widest = 0.0_f64;
            let mut from = 0;
            for &to in &self.cuts {
                widest = widest.max((self.measure)(&join(&self.words[from..to]))?);
                from = to;
            }
            if self.best.as_ref().is_none_or(|(w, _)| widest < *w) {
                self.best = Some((widest, self.cuts.clone()));
            }
            self.cuts.pop();
            return Ok(());
        }
        for end in start + 1..=n {
            if self.fits(start, end)?.is_none() {
                continue;
            }
            self.cuts.push(end);
            self.run(end, remaining - 1)?;
            self.cuts.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/textwrap.rs"]
mod tests;
