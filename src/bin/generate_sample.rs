use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Date32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde_json::json;

use tablita::data::export;
use tablita::data::model::{Dataset, Record, Value};

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn choice<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }

    /// Pick an item according to its relative weight.
    fn weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> &'a T {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (item, w) in items {
            if roll < *w {
                return item;
            }
            roll -= w;
        }
        &items[items.len() - 1].0
    }
}

const NOMBRES: &[&str] = &[
    "Ana", "Luis", "Camila", "Andrés", "María", "Juan", "Valentina", "Santiago", "Isabela",
    "Carlos", "Daniela", "Felipe", "Laura", "Mateo", "Sofía", "Diego",
];

const APELLIDOS: &[&str] = &[
    "García", "Rodríguez", "Martínez", "López", "Hernández", "Pérez", "Gómez", "Díaz", "Torres",
    "Ramírez", "Moreno", "Castro",
];

const MUNICIPIOS: &[&str] = &[
    "Barranquilla", "Santa Marta", "Cartagena", "Bogotá", "Medellín", "Tunja", "Manizales",
    "Cali", "Quibdó", "Buenaventura", "Villavicencio", "Yopal", "Leticia", "Puerto Inírida",
];

const OCUPACIONES: &[&str] = &[
    "Estudiante", "Docente", "Comerciante", "Agricultor", "Ingeniero", "Médico", "Desempleado",
    "Pensionado", "Emprendedor", "Obrero",
];

const REGIONES: &[(&str, f64)] = &[
    ("Caribe", 0.3),
    ("Andina", 0.4),
    ("Pacífica", 0.15),
    ("Orinoquía", 0.1),
    ("Amazonía", 0.05),
];

const VIVIENDAS: &[&str] = &["Propia", "Arrendada", "Familiar"];

fn fake_name(rng: &mut SimpleRng) -> String {
    format!(
        "{} {} {}",
        rng.choice(NOMBRES),
        rng.choice(APELLIDOS),
        rng.choice(APELLIDOS)
    )
}

fn main() -> Result<()> {
    let out_dir: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demo-data".to_string())
        .into();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(123);

    write_libros(&out_dir)?;
    write_ciudades(&out_dir)?;
    write_estudiantes(&out_dir, &mut rng)?;

    let demografia = generate_demografia(&mut rng);
    export::export_csv(&demografia, &out_dir.join("demografia.csv"))?;
    write_demografia_parquet(&demografia, &out_dir.join("demografia.parquet"))?;

    println!(
        "Wrote libros.json, ciudades.csv, estudiantes.csv, demografia.csv and demografia.parquet to {}",
        out_dir.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Small fixed datasets
// ---------------------------------------------------------------------------

fn write_libros(out_dir: &Path) -> Result<()> {
    let libros = json!([
        {
            "titulo": "Cien años de soledad",
            "autor": "Gabriel García Márquez",
            "ano": 1967,
            "genero": "Realismo mágico"
        },
        {
            "titulo": "Delirio",
            "autor": "Laura Restrepo",
            "ano": 2004,
            "genero": "Novela psicológica"
        },
        {
            "titulo": "La vorágine",
            "autor": "José Eustasio Rivera",
            "ano": 1924,
            "genero": "Novela de la selva"
        }
    ]);
    let path = out_dir.join("libros.json");
    std::fs::write(&path, serde_json::to_string_pretty(&libros)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn write_ciudades(out_dir: &Path) -> Result<()> {
    let path = out_dir.join("ciudades.csv");
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["ciudad", "altitud_m", "fundacion"])?;
    wtr.write_record(["Bogotá", "2640", "1538"])?;
    wtr.write_record(["Medellín", "1475", "1616"])?;
    wtr.write_record(["Cali", "995", "1536"])?;
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Students (summary / filter demo)
// ---------------------------------------------------------------------------

fn write_estudiantes(out_dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let path = out_dir.join("estudiantes.csv");
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["nombre", "edad", "promedio"])?;

    for _ in 0..40 {
        let nombre = fake_name(rng);
        let edad = rng.range_i64(15, 30);
        // Grades on the Colombian 0-5 scale, centred around 3.8.
        let promedio = (rng.gauss(3.8, 0.6).clamp(0.0, 5.0) * 100.0).round() / 100.0;
        wtr.write_record([nombre, edad.to_string(), promedio.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Demographic records (the ten-filter demo)
// ---------------------------------------------------------------------------

fn generate_demografia(rng: &mut SimpleRng) -> Dataset {
    let n = 50;
    let mut records = Vec::with_capacity(n);

    for i in 0..n {
        let edad = rng.range_i64(15, 75);
        let birth_year = 2024 - edad as i32;
        let fecha = format!(
            "{birth_year:04}-{:02}-{:02}",
            rng.range_i64(1, 12),
            rng.range_i64(1, 28)
        );

        // Rows 3-5 lose their income, rows 15-17 their occupation,
        // so the null-handling filters have something to bite on.
        let ingreso = if (3..=5).contains(&i) {
            Value::Null
        } else {
            Value::Int(rng.range_i64(800_000, 12_000_000))
        };
        let ocupacion = if (15..=17).contains(&i) {
            Value::Null
        } else {
            Value::Str(rng.choice(OCUPACIONES).to_string())
        };

        records.push(Record::from_pairs([
            ("id", Value::Int(i as i64 + 1)),
            ("nombre_completo", Value::Str(fake_name(rng))),
            ("edad", Value::Int(edad)),
            ("region", Value::Str(rng.weighted(REGIONES).to_string())),
            ("municipio", Value::Str(rng.choice(MUNICIPIOS).to_string())),
            ("ingreso_mensual", ingreso),
            ("ocupacion", ocupacion),
            ("tipo_vivienda", Value::Str(rng.choice(VIVIENDAS).to_string())),
            ("fecha_nacimiento", Value::Date(fecha)),
            (
                "acceso_internet",
                Value::Bool(rng.next_f64() < 0.7),
            ),
        ]));
    }

    let columns = [
        "id",
        "nombre_completo",
        "edad",
        "region",
        "municipio",
        "ingreso_mensual",
        "ocupacion",
        "tipo_vivienda",
        "fecha_nacimiento",
        "acceso_internet",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    Dataset::with_columns(records, columns)
}

fn write_demografia_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut ids = Vec::new();
    let mut nombres = Vec::new();
    let mut edades = Vec::new();
    let mut regiones = Vec::new();
    let mut municipios = Vec::new();
    let mut ingresos: Vec<Option<i64>> = Vec::new();
    let mut ocupaciones: Vec<Option<String>> = Vec::new();
    let mut viviendas = Vec::new();
    let mut fechas: Vec<i32> = Vec::new();
    let mut accesos = Vec::new();

    for rec in &dataset.records {
        let int = |col: &str| match rec.get(col) {
            Some(Value::Int(i)) => *i,
            _ => 0,
        };
        let text = |col: &str| match rec.get(col) {
            Some(Value::Str(s)) => s.clone(),
            _ => String::new(),
        };

        ids.push(int("id"));
        nombres.push(text("nombre_completo"));
        edades.push(int("edad"));
        regiones.push(text("region"));
        municipios.push(text("municipio"));
        ingresos.push(match rec.get("ingreso_mensual") {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        });
        ocupaciones.push(match rec.get("ocupacion") {
            Some(Value::Str(s)) => Some(s.clone()),
            _ => None,
        });
        viviendas.push(text("tipo_vivienda"));
        accesos.push(matches!(rec.get("acceso_internet"), Some(Value::Bool(true))));

        let iso = match rec.get("fecha_nacimiento") {
            Some(Value::Date(d)) => d.clone(),
            _ => String::new(),
        };
        let date = NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
            .with_context(|| format!("invalid generated date '{iso}'"))?;
        // Date32 counts days since the Unix epoch (day 719163 from CE).
        fechas.push(date.num_days_from_ce() - 719_163);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("nombre_completo", DataType::Utf8, false),
        Field::new("edad", DataType::Int64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("municipio", DataType::Utf8, false),
        Field::new("ingreso_mensual", DataType::Int64, true),
        Field::new("ocupacion", DataType::Utf8, true),
        Field::new("tipo_vivienda", DataType::Utf8, false),
        Field::new("fecha_nacimiento", DataType::Date32, false),
        Field::new("acceso_internet", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(nombres)),
            Arc::new(Int64Array::from(edades)),
            Arc::new(StringArray::from(regiones)),
            Arc::new(StringArray::from(municipios)),
            Arc::new(Int64Array::from(ingresos)),
            Arc::new(StringArray::from(ocupaciones)),
            Arc::new(StringArray::from(viviendas)),
            Arc::new(Date32Array::from(fechas)),
            Arc::new(BooleanArray::from(accesos)),
        ],
    )
    .context("building demographic record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
