// wxagent - conversational weather service with an operational metrics dashboard
//
// Copyright 2024 the wxagent authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Self-contained SVG charts: a line chart, an annotated bar chart and a
//! fixed-bin histogram. Output is deterministic for a given input, which
//! the renderer tests rely on.

use std::fmt::Write;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 560;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 110.0;

const SERIES_COLOR: &str = "#2b7bb9";
const AXIS_COLOR: &str = "#444444";
const GRID_COLOR: &str = "#dddddd";

/// A categorical line chart. One point per label, evenly spaced in input
/// order; labels absent from the input simply do not appear on the axis.
pub fn line_chart(title: &str, x_label: &str, y_label: &str, points: &[(String, u64)]) -> String {
    let mut svg = Frame::new(title, x_label, y_label, points);

    let mut path = String::new();
    for (i, (_, value)) in points.iter().enumerate() {
        let x = svg.slot_center(i);
        let y = svg.scale_y(*value);
        let _ = write!(path, "{}{:.1},{:.1}", if i == 0 { "" } else { " " }, x, y);
    }
    let _ = writeln!(
        svg.body,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        path, SERIES_COLOR
    );
    for (i, (_, value)) in points.iter().enumerate() {
        let cx = svg.slot_center(i);
        let cy = svg.scale_y(*value);
        let _ = writeln!(
            svg.body,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"/>"#,
            cx, cy, SERIES_COLOR
        );
    }

    svg.finish()
}

/// A bar chart with one bar per label, in input order. When `annotate` is
/// set each bar carries its numeric value above it.
pub fn bar_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    bars: &[(String, u64)],
    annotate: bool,
) -> String {
    let mut svg = Frame::new(title, x_label, y_label, bars);

    for (i, (_, value)) in bars.iter().enumerate() {
        let center = svg.slot_center(i);
        let width = svg.slot_width() * 0.7;
        let top = svg.scale_y(*value);
        let height = svg.baseline() - top;
        let _ = writeln!(
            svg.body,
            r#"<rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            center - width / 2.0,
            top,
            width,
            height,
            SERIES_COLOR
        );
        if annotate {
            let _ = writeln!(
                svg.body,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
                center,
                top - 5.0,
                value
            );
        }
    }

    svg.finish()
}

/// A histogram over raw samples with a fixed number of equal-width bins
/// spanning the observed min..max. All samples land in exactly one bin;
/// a degenerate spread (min == max) collapses into a single bin.
pub fn histogram(title: &str, x_label: &str, values: &[f64], bins: usize) -> String {
    let bars = bin_values(values, bins);
    bar_chart(title, x_label, "Frequency", &bars, false)
}

fn bin_values(values: &[f64], bins: usize) -> Vec<(String, u64)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![(format!("{:.1}", min), values.len() as u64)];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for v in values {
        let mut slot = ((v - min) / width) as usize;
        // the maximum sample belongs to the last bin, not one past it
        if slot >= bins {
            slot = bins - 1;
        }
        counts[slot] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lo = min + width * i as f64;
            let hi = min + width * (i + 1) as f64;
            (format!("{:.1}-{:.1}", lo, hi), count)
        })
        .collect()
}

/// Escape text for inclusion in SVG/HTML element content or attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared chart scaffolding: background, title, axes, y-axis grid lines
/// and rotated x-axis labels.
struct Frame {
    body: String,
    max_value: u64,
    slots: usize,
}

impl Frame {
    fn new(title: &str, x_label: &str, y_label: &str, data: &[(String, u64)]) -> Self {
        let max_value = data.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);
        let mut frame = Frame {
            body: String::new(),
            max_value,
            slots: data.len().max(1),
        };

        let _ = writeln!(
            frame.body,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = WIDTH,
            h = HEIGHT
        );
        let _ = writeln!(
            frame.body,
            r##"<rect width="{}" height="{}" fill="#ffffff"/>"##,
            WIDTH, HEIGHT
        );
        let _ = writeln!(
            frame.body,
            r#"<text x="{:.1}" y="30" text-anchor="middle" font-size="20">{}</text>"#,
            WIDTH as f64 / 2.0,
            escape(title)
        );

        // y grid and tick labels, quarters of the maximum
        for tick in 0..=4u64 {
            let value = frame.max_value * tick / 4;
            let y = frame.scale_y(value);
            let _ = writeln!(
                frame.body,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}"/>"#,
                MARGIN_LEFT,
                y,
                WIDTH as f64 - MARGIN_RIGHT,
                y,
                GRID_COLOR
            );
            let _ = writeln!(
                frame.body,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12">{}</text>"#,
                MARGIN_LEFT - 8.0,
                y + 4.0,
                value
            );
        }

        // axes
        let baseline = frame.baseline();
        let _ = writeln!(
            frame.body,
            r#"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="{c}"/>"#,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = baseline,
            c = AXIS_COLOR
        );
        let _ = writeln!(
            frame.body,
            r#"<line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="{c}"/>"#,
            l = MARGIN_LEFT,
            b = baseline,
            r = WIDTH as f64 - MARGIN_RIGHT,
            c = AXIS_COLOR
        );

        // axis titles
        let x_title_center = MARGIN_LEFT + frame.plot_width() / 2.0;
        let y_title_center = MARGIN_TOP + frame.plot_height() / 2.0;
        let _ = writeln!(
            frame.body,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">{}</text>"#,
            x_title_center,
            HEIGHT as f64 - 10.0,
            escape(x_label)
        );
        let _ = writeln!(
            frame.body,
            r#"<text x="18" y="{y:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 18 {y:.1})">{t}</text>"#,
            y = y_title_center,
            t = escape(y_label)
        );

        // rotated x labels
        for (i, (label, _)) in data.iter().enumerate() {
            let x = frame.slot_center(i);
            let y = frame.baseline() + 16.0;
            let _ = writeln!(
                frame.body,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="start" font-size="12" transform="rotate(45 {x:.1} {y:.1})">{l}</text>"#,
                x = x,
                y = y,
                l = escape(label)
            );
        }

        frame
    }

    fn plot_width(&self) -> f64 {
        WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn baseline(&self) -> f64 {
        HEIGHT as f64 - MARGIN_BOTTOM
    }

    fn slot_width(&self) -> f64 {
        self.plot_width() / self.slots as f64
    }

    fn slot_center(&self, index: usize) -> f64 {
        MARGIN_LEFT + self.slot_width() * (index as f64 + 0.5)
    }

    fn scale_y(&self, value: u64) -> f64 {
        self.baseline() - value as f64 / self.max_value as f64 * self.plot_height()
    }

    fn finish(mut self) -> String {
        self.body.push_str("</svg>\n");
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_has_one_bar_per_entry_and_annotations() {
        let bars = vec![("Berlin".to_string(), 3), ("Oslo".to_string(), 1)];
        let svg = bar_chart("Top Cities", "City", "Requests", &bars, true);
        assert_eq!(svg.matches(r#"<rect class="bar""#).count(), 2);
        assert!(svg.contains(">3</text>"));
        assert!(svg.contains(">1</text>"));
        assert!(svg.contains("Top Cities"));
    }

    #[test]
    fn line_chart_connects_points_in_order() {
        let points = vec![
            ("2024-05-01".to_string(), 2),
            ("2024-05-03".to_string(), 5),
        ];
        let svg = line_chart("Daily Requests", "Date", "Requests", &points);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("2024-05-01"));
        assert!(svg.contains("2024-05-03"));
    }

    #[test]
    fn labels_are_escaped() {
        let bars = vec![("<Tom & Jerry>".to_string(), 1)];
        let svg = bar_chart("A & B", "x", "y", &bars, false);
        assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
        assert!(svg.contains("A &amp; B"));
        assert!(!svg.contains("<Tom"));
    }

    #[test]
    fn histogram_bins_cover_all_samples() {
        let values: Vec<f64> = (0..90).map(|i| i as f64).collect();
        let bars = bin_values(&values, 30);
        assert_eq!(bars.len(), 30);
        assert_eq!(bars.iter().map(|(_, c)| *c).sum::<u64>(), 90);
        // the maximum sample must land in the last bin
        assert!(bars.last().unwrap().1 > 0);
    }

    #[test]
    fn histogram_with_uniform_samples_collapses_to_one_bin() {
        let bars = bin_values(&[42.0, 42.0, 42.0], 30);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].1, 3);
    }
}
