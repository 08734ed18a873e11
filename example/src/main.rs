use brine_colf::{Colfer, Timestamp, WireError};
use example_app::demo::{ext::Mark, Shape};

fn main() -> Result<(), WireError> {
    let mut shape = Shape {
        count: 300,
        delta: -5,
        label: "hello".to_string(),
        tags: vec!["a".to_string(), "b".to_string()],
        ..Default::default()
    };
    shape.set_at(Timestamp::from_seconds(1_500_000_000));
    shape.set_next(Some(Shape { flag: true, ..Default::default() }));
    shape.marks.push(Mark { id: 7, note: "seven".to_string() });

    let data = shape.marshal()?;
    println!("{} bytes:", data.len());
    for chunk in data.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("  {}", hex.join(" "));
    }

    let (decoded, n) = Shape::unmarshal(&data)?;
    println!("read {} bytes back, label = {:?}, next.flag = {}", n, decoded.label(), decoded.next().map_or(false, |s| s.flag));
    Ok(())
}
