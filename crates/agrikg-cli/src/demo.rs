//! Built-in sample data

use agrikg_core::Record;

pub const SAMPLE_TEXT: &str = "水稻是重要的粮食作物，容易感染稻瘟病。稻瘟病是由真菌引起的病害，\
会导致叶片出现病斑。防治稻瘟病可以使用三环唑农药。水稻生长需要\
充足的水分，适合在水田中种植。在温带气候条件下生长良好。";

pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "水稻容易得什么病？",
    "如何防治稻瘟病？",
    "什么是水稻？",
    "水稻用什么肥料？",
    "稻瘟病怎么办？",
];

pub fn sample_records() -> Vec<Record> {
    [
        ("水稻", "稻瘟病", "尿素", "水田"),
        ("小麦", "小麦锈病", "磷酸二铵", "旱地"),
        ("玉米", "玉米螟", "复合肥", "旱地"),
    ]
    .into_iter()
    .map(|(crop, disease, fertilizer, soil)| {
        Record::new()
            .with("crop_name", crop)
            .with("disease", disease)
            .with("fertilizer", fertilizer)
            .with("soil", soil)
    })
    .collect()
}
