use crate::domain::errors::ChartResult;
use crate::domain::market_data::{Series, Symbol};

/// Where the series store gets bars for a symbol it has not seen yet.
pub trait SeriesSource {
    fn load(&self, symbol: &Symbol) -> ChartResult<Series>;
}

impl<F> SeriesSource for F
where
    F: Fn(&Symbol) -> ChartResult<Series>,
{
    fn load(&self, symbol: &Symbol) -> ChartResult<Series> {
        self(symbol)
    }
}
