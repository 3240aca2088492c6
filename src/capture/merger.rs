use log::info;
use crate::capture::config::CaptureConfig;
use crate::capture::error::ConsistencyError;
/// Concatenate the channel samples of consecutive captures of one acquisition.
///
/// The first capture provides every non-sample field; later captures only
/// contribute samples, appended in list order. Channel count, channel order
/// and `datalen` must agree across all inputs.
pub fn merge_captures(
    captures: impl IntoIterator<Item = CaptureConfig>,
) -> Result<CaptureConfig, ConsistencyError> {
    let mut captures = captures.into_iter();
    let mut base = captures.next().ok_or(ConsistencyError::NoCaptures)?;
    check_sample_lengths(&base)?;
    for (offset, next) in captures.enumerate() {
        let index = offset + 1;
        check_compatible(&base, &next, index)?;
        check_sample_lengths(&next)?;
        for (target, source) in base.channels.iter_mut().zip(next.channels) {
            target.raw_data.extend(source.raw_data);
            target.calibrated_data.extend(source.calibrated_data);
        }
    }
    info!(
        "merged capture: {} channels x {} samples",
        base.channels.len(),
        base.channels.first().map(|c| c.raw_data.len()).unwrap_or(0)
    );
    Ok(base)
}
fn check_compatible(
    base: &CaptureConfig,
    next: &CaptureConfig,
    index: usize,
) -> Result<(), ConsistencyError> {
    if base.sample.data_len != next.sample.data_len {
        return Err(ConsistencyError::DataLenMismatch {
            index,
            expected: base.sample.data_len,
            actual: next.sample.data_len,
        });
    }
    if base.channels.len() != next.channels.len() {
        return Err(ConsistencyError::ChannelCountMismatch {
            index,
            expected: base.channels.len(),
            actual: next.channels.len(),
        });
    }
    for (position, (a, b)) in base.channels.iter().zip(&next.channels).enumerate() {
        if a.name != b.name {
            return Err(ConsistencyError::ChannelNameMismatch {
                index,
                position,
                expected: a.name.clone(),
                actual: b.name.clone(),
            });
        }
    }
    Ok(())
}
fn check_sample_lengths(capture: &CaptureConfig) -> Result<(), ConsistencyError> {
    for channel in &capture.channels {
        if channel.raw_data.len() != channel.calibrated_data.len() {
            return Err(ConsistencyError::SampleLengthMismatch {
                channel: channel.name.clone(),
                raw: channel.raw_data.len(),
                calibrated: channel.calibrated_data.len(),
            });
        }
    }
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::decoder::decode_capture;
    use crate::capture::decoder::tests::synthetic_capture;
    use rand::Rng;
    const CHANNELS: [(&str, &str); 2] = [("CH1", "ON"), ("CH2", "ON")];
    fn capture(data_len: usize, seed: i16) -> CaptureConfig {
        let buffers: Vec<Vec<i16>> = (0..CHANNELS.len() as i16)
            .map(|ch| (0..data_len as i16).map(|i| seed * 10 + ch * 100 + i).collect())
            .collect();
        decode_capture(&synthetic_capture(data_len, &CHANNELS, &buffers)).unwrap()
    }
    #[test]
    fn appends_in_file_order() {
        let merged = merge_captures(vec![capture(3, 1), capture(3, 2)]).unwrap();
        assert_eq!(merged.sample.data_len, 3);
        assert_eq!(merged.channels[0].raw_data, vec![10, 11, 12, 20, 21, 22]);
        assert_eq!(merged.channels[1].raw_data, vec![110, 111, 112, 120, 121, 122]);
        assert_eq!(merged.channels[1].calibrated_data.len(), 6);
    }
    #[test]
    fn merge_is_associative() {
        let (a, b, c) = (capture(4, 1), capture(4, 2), capture(4, 3));
        let flat = merge_captures(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        let nested = merge_captures(vec![merge_captures(vec![a, b]).unwrap(), c]).unwrap();
        assert_eq!(flat, nested);
    }
    #[test]
    fn merged_length_is_files_times_data_len() {
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let files = rng.gen_range(1..6);
            let data_len = rng.gen_range(1..20);
            let merged =
                merge_captures((0..files).map(|seed| capture(data_len, seed as i16))).unwrap();
            for channel in &merged.channels {
                assert_eq!(channel.raw_data.len(), files * data_len);
                assert_eq!(channel.calibrated_data.len(), files * data_len);
            }
            assert_eq!(merged.sample.data_len, data_len);
        }
    }
    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            merge_captures(Vec::new()),
            Err(ConsistencyError::NoCaptures)
        ));
    }
    #[test]
    fn channel_count_mismatch_is_rejected() {
        let mut other = capture(3, 2);
        other.channels.pop();
        assert!(matches!(
            merge_captures(vec![capture(3, 1), other]),
            Err(ConsistencyError::ChannelCountMismatch { index: 1, expected: 2, actual: 1 })
        ));
    }
    #[test]
    fn channel_order_mismatch_is_rejected() {
        let mut other = capture(3, 2);
        other.channels.swap(0, 1);
        assert!(matches!(
            merge_captures(vec![capture(3, 1), other]),
            Err(ConsistencyError::ChannelNameMismatch { position: 0, .. })
        ));
    }
    #[test]
    fn data_len_mismatch_is_rejected() {
        assert!(matches!(
            merge_captures(vec![capture(3, 1), capture(4, 2)]),
            Err(ConsistencyError::DataLenMismatch { expected: 3, actual: 4, .. })
        ));
    }
    #[test]
    fn uneven_channel_samples_are_rejected() {
        let mut other = capture(3, 2);
        other.channels[1].calibrated_data.pop();
        assert!(matches!(
            merge_captures(vec![capture(3, 1), other]),
            Err(ConsistencyError::SampleLengthMismatch { .. })
        ));
    }
}
