/// One focusable position in a dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusStop {
    /// Control `stop` of Interface Map row `row`.
    Field { row: usize, stop: usize },
    Ok,
    Cancel,
}

#[derive(Clone, Debug)]
pub struct FocusRing {
    stops: Vec<FocusStop>,
    cursor: usize,
}

impl FocusRing {
    /// Build from the number of focusable controls on each row; OK and
    /// Cancel close the ring.
    pub fn new(stops_per_row: &[usize]) -> Self {
        let mut stops = Vec::new();
        for (row, n) in stops_per_row.iter().enumerate() {
            for stop in 0..*n {
                stops.push(FocusStop::Field { row, stop });
            }
        }
        stops.push(FocusStop::Ok);
        stops.push(FocusStop::Cancel);
        Self { stops, cursor: 0 }
    }

    pub fn current(&self) -> FocusStop {
        self.stops[self.cursor]
    }

    pub fn next(&mut self) {
        self.cursor = (self.cursor + 1) % self.stops.len();
    }

    pub fn prev(&mut self) {
        self.cursor = (self.cursor + self.stops.len() - 1) % self.stops.len();
    }

    pub fn focus(&mut self, stop: FocusStop) -> bool {
        match self.stops.iter().position(|s| *s == stop) {
            Some(i) => {
                self.cursor = i;
                true
            }
            None => false,
        }
    }

    /// Focused control index on `row`, if focus is on that row.
    pub fn stop_on_row(&self, row: usize) -> Option<usize> {
        match self.current() {
            FocusStop::Field { row: r, stop } if r == row => Some(stop),
            _ => None,
        }
    }
}
