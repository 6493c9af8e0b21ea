use super::InputView;
use crate::core::signal::width_mask;

/// One-hot decoder index; `input1` is the most significant select bit.
pub(crate) fn decoder3_index(i1: u32, i2: u32, i3: u32) -> u32 {
    (i1 & 1) * 4 + (i2 & 1) * 2 + (i3 & 1)
}

/// Binary index of the first asserted input, LSB emitted on `outValue1`.
/// All-zero input encodes as 0.
pub(crate) fn encoder8_index(view: &InputView) -> u32 {
    for position in 0..8u32 {
        let name = format!("input{}", position + 1);
        if view.value(&name) == 1 {
            return position;
        }
    }
    0
}

/// Pack `lanes` inputs of `lane_width` bits into one value, input1 lowest.
pub(crate) fn collect(view: &InputView, lanes: u32, lane_width: u8) -> u32 {
    let mask = width_mask(lane_width);
    let mut value = 0u32;
    for lane in 0..lanes {
        let name = format!("input{}", lane + 1);
        value |= (view.value(&name) & mask) << (lane * u32::from(lane_width));
    }
    value
}

/// Extract one lane of a packed value, lane 0 lowest.
pub(crate) fn split_lane(value: u32, lane: u32, lane_width: u8) -> u32 {
    (value >> (lane * u32::from(lane_width))) & width_mask(lane_width)
}

/// Select the data input indexed by `selection`; an index past the data
/// ports reads as 0 like any unconnected input.
pub(crate) fn mux_select(view: &InputView, lanes: u32) -> u32 {
    let selection = view.value("selection");
    if selection >= lanes {
        return 0;
    }
    let name = format!("input{}", selection + 1);
    view.value(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::Signal;

    #[test]
    fn test_decoder_one_hot_index() {
        assert_eq!(decoder3_index(0, 0, 0), 0);
        assert_eq!(decoder3_index(0, 0, 1), 1);
        assert_eq!(decoder3_index(0, 1, 0), 2);
        assert_eq!(decoder3_index(1, 0, 0), 4);
        assert_eq!(decoder3_index(1, 1, 1), 7);
    }

    #[test]
    fn test_encoder_first_asserted_wins() {
        let view = InputView::from_values(&[
            ("input3", Signal::bit(1)),
            ("input5", Signal::bit(1)),
        ]);
        assert_eq!(encoder8_index(&view), 2);

        let none = InputView::new();
        assert_eq!(encoder8_index(&none), 0);
    }

    #[test]
    fn test_collect_bits_lsb_first() {
        let view = InputView::from_values(&[
            ("input1", Signal::bit(1)),
            ("input2", Signal::bit(0)),
            ("input3", Signal::bit(1)),
        ]);
        assert_eq!(collect(&view, 3, 1), 0b101);
    }

    #[test]
    fn test_collect_bytes_lsb_first() {
        let view = InputView::from_values(&[
            ("input1", Signal::new(0x11, 8)),
            ("input2", Signal::new(0x22, 8)),
            ("input3", Signal::new(0x33, 8)),
            ("input4", Signal::new(0x44, 8)),
        ]);
        assert_eq!(collect(&view, 4, 8), 0x4433_2211);
    }

    #[test]
    fn test_split_round_trip() {
        let value = 0xAB_u32;
        let mut rebuilt = 0u32;
        for lane in 0..8 {
            rebuilt |= split_lane(value, lane, 1) << lane;
        }
        assert_eq!(rebuilt, value);

        assert_eq!(split_lane(0x4433_2211, 0, 8), 0x11);
        assert_eq!(split_lane(0x4433_2211, 3, 8), 0x44);
    }

    #[test]
    fn test_mux_selects_indexed_input() {
        let view = InputView::from_values(&[
            ("selection", Signal::new(2, 2)),
            ("input1", Signal::new(0xA, 8)),
            ("input2", Signal::new(0xB, 8)),
            ("input3", Signal::new(0xC, 8)),
            ("input4", Signal::new(0xD, 8)),
        ]);
        assert_eq!(mux_select(&view, 4), 0xC);
    }

    #[test]
    fn test_mux_out_of_range_selection_reads_zero() {
        let view = InputView::from_values(&[
            ("selection", Signal::new(3, 2)),
            ("input1", Signal::new(0xA, 8)),
            ("input2", Signal::new(0xB, 8)),
        ]);
        assert_eq!(mux_select(&view, 2), 0);
    }
}
