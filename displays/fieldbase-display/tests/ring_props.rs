use fieldbase_display::{Color, DisplayError, DisplayLine, DisplayRing, DisplaySurface, HEADER};
use proptest::prelude::*;

/// Keeps only the text printed since the last clear
#[derive(Default)]
struct Panel {
    printed: Vec<String>,
}

impl DisplaySurface for Panel {
    fn clear_screen(&mut self, _color: Color) -> Result<(), DisplayError> {
        self.printed.clear();
        Ok(())
    }

    fn set_cursor(&mut self, _x: u16, _y: u16) {}

    fn set_text_color(&mut self, _color: Color) {}

    fn set_text_size(&mut self, _size: u8) {}

    fn draw_hline(&mut self, _x: u16, _y: u16, _w: u16, _c: Color) -> Result<(), DisplayError> {
        Ok(())
    }

    fn println(&mut self, text: &str) -> Result<(), DisplayError> {
        self.printed.push(text.to_string());
        Ok(())
    }

    fn width(&self) -> u16 {
        160
    }
}

proptest! {
    #[test]
    fn ring_shows_most_recent_in_order(count in 0usize..40) {
        let mut ring: DisplayRing<Panel, 11> = DisplayRing::new(Panel::default());
        for i in 0..count {
            ring.append(DisplayLine::new(&format!("line {i}"))).unwrap();
        }

        let start = count.saturating_sub(11);
        let expected: Vec<String> = (start..count).map(|i| format!("line {i}")).collect();
        let held: Vec<String> = ring.lines().map(|l| l.as_str().to_string()).collect();
        prop_assert_eq!(&held, &expected);
        prop_assert_eq!(ring.len(), count.min(11));

        if count > 0 {
            let panel = &ring.surface().printed;
            prop_assert_eq!(panel[0].as_str(), HEADER);
            prop_assert_eq!(&panel[1..], expected.as_slice());
        }
    }
}
