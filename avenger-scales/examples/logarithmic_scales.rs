use avenger_scales::continuous::ContinuousScale;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Logarithmic and Power Scale Examples ===\n");

    println!("1. Log Scale (base 10, domain [1, 1000]):");
    let log_scale = ContinuousScale::log(vec![1.0, 1000.0], vec![0.0, 300.0], 10.0)?;
    for input in [1.0, 10.0, 100.0, 1000.0] {
        println!("  {:.0} → {:.1}", input, log_scale.scale(input));
    }
    println!("Ticks (10 requested): {:?}", log_scale.ticks(10.0));
    println!("Ticks (4 requested): {:?}", log_scale.ticks(4.0));

    println!("\n2. Log Scale (base 2):");
    let log2_scale = ContinuousScale::log(vec![1.0, 64.0], vec![0.0, 200.0], 2.0)?;
    for input in [1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0] {
        println!("  {:.0} → {:.1}", input, log2_scale.scale(input));
    }

    println!("\n3. Symlog Scale (handles negative values and zero):");
    let symlog_scale = ContinuousScale::symlog(vec![-1000.0, 1000.0], vec![0.0, 400.0], 100.0)?;
    for input in [-1000.0, -100.0, -10.0, 0.0, 10.0, 100.0, 1000.0] {
        println!("  {:.0} → {:.1}", input, symlog_scale.scale(input));
    }

    println!("\n4. Square Root Scale (for area-based visualizations):");
    let sqrt_scale = ContinuousScale::sqrt(vec![0.0, 100.0], vec![0.0, 200.0])?;
    for input in [0.0, 25.0, 50.0, 100.0] {
        let px = sqrt_scale.scale(input);
        println!("  {:.0} → {:.1} (inverts to {:.1})", input, px, sqrt_scale.invert(px));
    }

    Ok(())
}
