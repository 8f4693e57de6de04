use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Render a measurement the way a bench scientist might type it.
fn messy_cell(value: f64, rng: &mut SimpleRng) -> String {
    let roll = rng.next_f64();
    if roll < 0.08 {
        ["ND", "n.d.", "N.D."][(rng.next_u64() % 3) as usize].to_string()
    } else if roll < 0.35 {
        format!("{value:.2} mg/mL")
    } else if roll < 0.45 {
        format!("{value:.3e} A.U.")
    } else {
        format!("{value:.3}")
    }
}

const CONFIG_TEMPLATE: &str = "\
# Sample run for tidy-lab
Graph: Box
Model: linear
Independent Variable: {Treatment}
Dependent Variable: {value}
";

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let groups = [("Control", 1.0), ("Low Dose", 1.8), ("High Dose", 3.2)];
    let replicates = 5;
    let subjects_per_group = 4;

    let output_path = "sample_messy.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header = vec![" Treatment ".to_string()];
    header.extend((1..=replicates).map(|r| format!("Rep {r}")));
    writer.write_record(&header).context("writing header")?;

    let mut rows = 0;
    for (label, mean) in groups {
        for _ in 0..subjects_per_group {
            let mut record = vec![label.to_string()];
            for _ in 0..replicates {
                let value = rng.gauss(mean, 0.15 * mean).max(0.01);
                record.push(messy_cell(value, &mut rng));
            }
            writer.write_record(&record).context("writing row")?;
            rows += 1;
        }
    }
    writer.flush().context("flushing CSV")?;

    let config_path = "sample_run.cfg";
    std::fs::write(config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("writing {config_path}"))?;

    println!("Wrote {rows} subjects × {replicates} replicates to {output_path}");
    println!("Config written to {config_path}");
    Ok(())
}
