//! Generate a deterministic sample CSV of case records for manual testing.
//!
//! Usage: `cargo run --bin generate_sample [output.csv]`

use chrono::NaiveDate;

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

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Weighted pick: heavier entries come first.
    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        // Squaring biases toward the front of the list, giving the top-N
        // charts something to rank.
        let r = self.next_f64();
        items[(r * r * items.len() as f64) as usize % items.len()]
    }
}

const STATUSES: [&str; 4] = [
    "Em análise",
    "Concluído",
    "Aguardando documentação",
    "Arquivado",
];

const MUNICIPALITIES: [&str; 10] = [
    "Belém",
    "Ananindeua",
    "Santarém",
    "Marabá",
    "Castanhal",
    "Parauapebas",
    "Abaetetuba",
    "Cametá",
    "Bragança",
    "Altamira",
];

const SUBJECTS: [&str; 6] = [
    "Regularização Fundiária",
    "Licenciamento Ambiental",
    "Recurso Administrativo",
    "Certidão de Uso do Solo",
    "Alvará de Construção",
    "Desmembramento de Lote",
];

fn main() {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_processos.csv".to_string());

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output).expect("creating output CSV");

    writer
        .write_record([
            "Protocolo",
            "Dt. Entrada",
            "Dt. Saída",
            "STATUS",
            "MUNICÍPIO",
            "Assunto",
        ])
        .expect("writing header");

    let n_records = 400;
    for i in 0..n_records {
        let year = [2022, 2023, 2024][rng.below(3)];
        let month = 1 + rng.below(12) as u32;
        let day = 1 + rng.below(28) as u32;
        let entry = NaiveDate::from_ymd_opt(year, month, day).unwrap();

        let status = rng.pick(&STATUSES);
        // Completed cases get an exit date; processing time is skewed so the
        // histogram has a tail.
        let exit = if status == "Concluído" || status == "Arquivado" {
            let days = (rng.next_f64().powi(2) * 365.0) as i64;
            Some(entry + chrono::Duration::days(days))
        } else {
            None
        };

        writer
            .write_record([
                format!("{year}/{:04}", i + 1).as_str(),
                entry.to_string().as_str(),
                exit.map(|d| d.to_string()).unwrap_or_default().as_str(),
                status,
                rng.pick(&MUNICIPALITIES),
                rng.pick(&SUBJECTS),
            ])
            .expect("writing record");
    }

    // A few dirty rows the loader is expected to drop.
    for record in [
        ["2022/9001", "", "", "Em análise", "Belém", "Recurso Administrativo"],
        [
            "2022/9002",
            "sem data",
            "",
            "Arquivado",
            "Santarém",
            "Licenciamento Ambiental",
        ],
        [
            "2023/9003",
            "2023-05-10",
            "2023-04-01",
            "Concluído",
            "Marabá",
            "Regularização Fundiária",
        ],
    ] {
        writer.write_record(record).expect("writing record");
    }

    writer.flush().expect("flushing CSV");
    println!("Wrote {} records (+3 invalid) to {output}", n_records);
}
