//! ASCII credit-history chart

use crate::history::CreditHistory;

const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 3;

/// Draw `history` as a line chart `width` columns by `height` rows.
///
/// Longer histories are down-sampled by averaging equal buckets. The y-axis
/// always spans zero, which is drawn as a dashed baseline.
pub fn render(history: &[f64], width: usize, height: usize, title: &str) -> String {
    let games = history.len().saturating_sub(1) as u64;
    draw(history, games, width, height, title)
}

/// Draw a simulation's bounded [`CreditHistory`]
pub fn render_history(
    history: &CreditHistory,
    width: usize,
    height: usize,
    title: &str,
) -> String {
    draw(&history.points(), history.games(), width, height, title)
}

fn draw(history: &[f64], games: u64, width: usize, height: usize, title: &str) -> String {
    let mut output = format!("{title}\n");
    if history.len() < 2 {
        output.push_str("(not enough data to plot)\n");
        return output;
    }

    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let points = downsample(history, width);

    let mut low = points.iter().copied().fold(0.0_f64, f64::min);
    let mut high = points.iter().copied().fold(0.0_f64, f64::max);
    if high - low < f64::EPSILON {
        high += 1.0;
        low -= 1.0;
    }
    let row_of = |value: f64| -> usize {
        let scaled = (high - value) / (high - low) * (height - 1) as f64;
        (scaled.round() as usize).min(height - 1)
    };

    let mut grid = vec![vec![' '; points.len()]; height];
    let zero_row = row_of(0.0);
    for cell in grid[zero_row].iter_mut() {
        *cell = '-';
    }

    let mut previous: Option<usize> = None;
    for (col, &value) in points.iter().enumerate() {
        let row = row_of(value);
        if let Some(prev) = previous {
            let (from, to) = if prev < row { (prev, row) } else { (row, prev) };
            for line in grid.iter_mut().take(to).skip(from + 1) {
                line[col] = '|';
            }
        }
        grid[row][col] = '*';
        previous = Some(row);
    }

    let top = format!("{high:.0}");
    let bottom = format!("{low:.0}");
    let label_width = top.len().max(bottom.len()).max(1);

    for (row, cells) in grid.iter().enumerate() {
        let label = if row == 0 {
            top.as_str()
        } else if row == height - 1 {
            bottom.as_str()
        } else if row == zero_row {
            "0"
        } else {
            ""
        };
        let line: String = cells.iter().collect();
        output.push_str(&format!("{label:>label_width$} |{line}\n"));
    }

    output.push_str(&format!(
        "{:>label_width$} +{}\n",
        "",
        "-".repeat(points.len())
    ));
    output.push_str(&format!(
        "{:>label_width$}  games 0..{games}\n",
        ""
    ));
    output
}

/// Average equal buckets down to at most `width` points
fn downsample(history: &[f64], width: usize) -> Vec<f64> {
    if history.len() <= width {
        return history.to_vec();
    }
    (0..width)
        .map(|col| {
            let start = col * history.len() / width;
            let end = ((col + 1) * history.len() / width).max(start + 1);
            let bucket = &history[start..end];
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}
