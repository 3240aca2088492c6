use std::io::Cursor;
use std::ops::Range;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::capture::config::ChannelConfig;
use crate::capture::error::{CaptureError, Result};
use crate::capture::scope::Capture;
/// Raw-count half height of the instrument screen view.
const SCREEN_Y_LIMIT: f64 = 2000.0;
const SCREEN_Y_DIVS: usize = 10;
const SCREEN_X_DIVS: usize = 15;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Horizontal spacing of samples on the waveform plot, in milliseconds.
    pub ms_per_sample: f64,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            background: WHITE,
            palette: vec![
                RGBColor(230, 159, 0),
                BLUE,
                GREEN,
                MAGENTA,
                CYAN,
                BLACK,
            ],
            ms_per_sample: 1.0 / 50.0,
        }
    }
}
/// Calibrated waveform of one channel with its detected dips marked.
pub fn render_channel_png(
    channel: &ChannelConfig,
    title: &str,
    range: Option<Range<usize>>,
    style: &PlotStyle,
) -> Result<Vec<u8>> {
    let window: &[f64] = match range.clone() {
        Some(r) => {
            let end = r.end.min(channel.calibrated_data.len());
            &channel.calibrated_data[r.start.min(end)..end]
        }
        None => &channel.calibrated_data,
    };
    if window.is_empty() {
        return Err(CaptureError::Plot(format!(
            "channel {} has no samples in the requested range",
            channel.name
        )));
    }
    let peaks = channel.find_peaks(range);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (y_min, y_max) = window
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let pad = ((y_max - y_min) * 0.05).max(0.01);
        let x_max = (window.len() as f64 * style.ms_per_sample).max(style.ms_per_sample);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 20))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_max, (y_min - pad)..(y_max + pad))?;
        chart
            .configure_mesh()
            .x_desc("Time (ms)")
            .y_desc("Voltage (V)")
            .light_line_style(&BLACK.mix(0.05))
            .draw()?;
        let trace = style.palette.first().copied().unwrap_or(BLUE);
        chart.draw_series(LineSeries::new(
            window
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64 * style.ms_per_sample, *v)),
            &trace,
        ))?;
        chart
            .draw_series(peaks.iter().map(|&i| {
                Circle::new((i as f64 * style.ms_per_sample, window[i]), 3, RED.filled())
            }))?
            .label(format!("Signal Peaks ({})", peaks.len()))
            .legend(|(x, y)| Circle::new((x + 10, y), 3, RED.filled()));
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .border_style(&BLACK.mix(0.3))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Instrument-screen style view of one file-sized frame of raw samples for
/// every displayed channel.
pub fn render_screen_png(capture: &Capture, frame: usize, style: &PlotStyle) -> Result<Vec<u8>> {
    let data_len = capture.data_len();
    if frame >= capture.frame_count() {
        return Err(CaptureError::Plot(format!(
            "frame {frame} out of range, capture holds {} frames",
            capture.frame_count()
        )));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x_max = data_len as f64;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0f64..x_max, -SCREEN_Y_LIMIT..SCREEN_Y_LIMIT)?;
        chart
            .configure_mesh()
            .x_labels(SCREEN_X_DIVS)
            .y_labels(SCREEN_Y_DIVS + 1)
            .disable_x_mesh()
            .disable_y_mesh()
            .draw()?;
        let grid = BLACK.mix(0.2);
        for i in 0..=SCREEN_Y_DIVS {
            let y = -SCREEN_Y_LIMIT + i as f64 * 2.0 * SCREEN_Y_LIMIT / SCREEN_Y_DIVS as f64;
            chart.draw_series(LineSeries::new([(0.0, y), (x_max, y)], &grid))?;
        }
        for i in 0..SCREEN_X_DIVS {
            let x = 25.0 * x_max / 760.0 + i as f64 * x_max / SCREEN_X_DIVS as f64;
            chart.draw_series(LineSeries::new(
                [(x, -SCREEN_Y_LIMIT), (x, SCREEN_Y_LIMIT)],
                &grid,
            ))?;
        }
        let axis = RGBColor(128, 128, 128);
        chart.draw_series(LineSeries::new([(0.0, 0.0), (x_max, 0.0)], &axis))?;
        chart.draw_series(LineSeries::new(
            [(x_max / 2.0, -SCREEN_Y_LIMIT), (x_max / 2.0, SCREEN_Y_LIMIT)],
            &axis,
        ))?;
        for (idx, channel) in capture.active_channels().into_iter().enumerate() {
            let color = style
                .palette
                .get(idx % style.palette.len().max(1))
                .copied()
                .unwrap_or(BLUE);
            let samples = channel.raw_frame(frame, data_len);
            chart
                .draw_series(LineSeries::new(
                    samples.iter().enumerate().map(|(i, v)| (i as f64, f64::from(*v))),
                    &color,
                ))?
                .label(channel.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(format!(
                    "{}{} ({})  / div",
                    channel.probe, channel.scale, channel.name
                ))
                .legend(|(x, y)| EmptyElement::at((x, y)));
        }
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(format!("{} / div", capture.config.timebase.scale))
            .legend(|(x, y)| EmptyElement::at((x, y)));
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(&BLACK.mix(0.3))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| CaptureError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
