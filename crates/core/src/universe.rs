use crate::domain::candidate::{Segment, TickerCandidate};

/// Built-in Taiwan universe: large caps and actively traded names across the main board (`.TW`)
/// and the OTC board (`.TWO`). Kept in source order; repeated symbols are not removed.
pub const TW_UNIVERSE: &[&str] = &[
    "2330.TW", "2317.TW", "2454.TW", "2303.TW", "2308.TW", "2382.TW", "3231.TW", "2357.TW",
    "2376.TW", "2356.TW", "2379.TW", "2383.TW", "2368.TW", "2353.TW", "2324.TW", "2344.TW",
    "2449.TW", "2408.TW", "3443.TW", "3034.TW", "3711.TW", "3037.TW", "3035.TW", "3017.TW",
    "3008.TW", "3189.TW", "3532.TW", "3661.TW", "4938.TW", "4958.TW", "5269.TW", "5274.TWO",
    "6669.TW", "6415.TW", "6531.TW", "6770.TW", "8046.TW", "8210.TW", "3653.TW", "2603.TW",
    "2609.TW", "2615.TW", "2618.TW", "2610.TW", "2605.TW", "2606.TW", "2637.TW", "2634.TW",
    "1605.TW", "1609.TW", "1513.TW", "1519.TW", "1503.TW", "1504.TW", "1514.TW", "2002.TW",
    "2014.TW", "2027.TW", "1101.TW", "1102.TW", "1301.TW", "1303.TW", "1326.TW", "1907.TW",
    "9904.TW", "9945.TW", "2515.TW", "2881.TW", "2882.TW", "2891.TW", "2886.TW", "2884.TW",
    "2892.TW", "2880.TW", "2885.TW", "2883.TW", "2890.TW", "2887.TW", "2834.TW", "5880.TW",
    "5871.TW", "5876.TW", "2812.TW", "2801.TW", "2409.TW", "3481.TW", "6116.TW", "2481.TW",
    "3019.TW", "2313.TW", "3062.TW", "3596.TWO", "4906.TW", "5388.TWO", "6285.TW", "8069.TWO",
    "3707.TW", "2392.TW", "6239.TW", "6278.TW", "3583.TW", "3376.TW", "6213.TW", "3044.TW",
    "6446.TWO", "6472.TWO", "4114.TWO", "4128.TWO", "4743.TWO", "6180.TWO", "5347.TWO", "3293.TWO",
    "3324.TWO", "6147.TWO", "8044.TWO", "8299.TWO", "3105.TWO", "3374.TWO", "3693.TWO", "3529.TWO",
    "3548.TWO", "3264.TWO", "4966.TWO", "4979.TWO", "5371.TWO", "5483.TWO", "6121.TWO", "6182.TWO",
    "6217.TWO", "6223.TWO", "6274.TWO", "6547.TWO", "6589.TWO", "8086.TWO", "8255.TWO", "8358.TWO",
    "8936.TWO", "8050.TWO", "6104.TWO", "3680.TWO", "3260.TWO", "3227.TWO", "3218.TWO", "3163.TWO",
    "3141.TWO", "3128.TWO", "1795.TWO", "1565.TWO", "1216.TW", "1402.TW", "1476.TW", "2105.TW",
    "2207.TW", "2345.TW", "2395.TW", "2412.TW", "2474.TW", "2492.TW", "2912.TW", "3045.TW",
    "3702.TW", "4915.TW", "5871.TW", "6505.TW", "9910.TW", "9921.TW", "9941.TW",
];

/// Splits a comma-separated symbol list, dropping blanks and upper-casing suffixes.
pub fn parse_symbols(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

/// `SCAN_UNIVERSE` when set and non-empty, otherwise the built-in list.
pub fn configured_universe() -> Vec<String> {
    if let Ok(s) = std::env::var("SCAN_UNIVERSE") {
        let parsed = parse_symbols(&s);
        if !parsed.is_empty() {
            return parsed;
        }
    }
    TW_UNIVERSE.iter().map(|s| s.to_string()).collect()
}

/// Zero-volume candidates for listing purposes; ranking volume is filled in by a scan.
pub fn as_candidates(symbols: &[String]) -> Vec<TickerCandidate> {
    symbols
        .iter()
        .map(|s| TickerCandidate::new(s.clone(), 0))
        .collect()
}

pub fn segment_counts(symbols: &[String]) -> (usize, usize) {
    symbols.iter().fold((0, 0), |(listed, otc), s| match Segment::from_symbol(s) {
        Segment::Listed => (listed + 1, otc),
        Segment::Otc => (listed, otc + 1),
        Segment::Other => (listed, otc),
    })
}
