// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// YAML-ish demo config file loader

use std::fs::File;
use std::io::{self,BufRead,BufReader,Lines};
use std::path::Path;

use log::debug;
use thiserror::Error;

#[derive(Debug,Error)]
pub enum ConfigError {
    #[error("unable to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Syntax {
        line: usize,
        message: String,
    },
}

#[derive(Debug)]
struct Line {
    indent: usize,
    dashed: bool,
    key: String,
    value: String,
}

struct Parser<R: BufRead> {
    lines: Lines<R>,
    pub linenr: usize,
    pub line: Option<Line>,
}

impl<R: BufRead> Parser<R> {
    pub fn accept(&mut self) -> Result<(),ConfigError> {
        loop {
            let mut line = match self.lines.next() {
                None => {
                    self.line = None;
                    return Ok(());  // end-of-file
                },
                Some(line) => line?,
            };
            self.linenr += 1;
            let indent = line.chars().take_while(|c| *c == ' ').count();
            line = line.split_off(indent);
            if !line.is_empty() && !line.starts_with('#') {
                let dashed = if line.starts_with('-') {
                    line = line.split_off(1).trim().to_string();
                    true
                }
                else {
                    false
                };
                let (key,value) = match line.find(':') {
                    Some(i) => (line[..i].trim().to_string(),line[i + 1..].trim().to_string()),
                    None => (line.trim().to_string(),String::new()),
                };
                self.line = Some(Line { indent: indent,dashed: dashed,key: key,value: value, });
                return Ok(());
            }
        }
    }

    fn error<T>(&self,message: &str) -> Result<T,ConfigError> {
        Err(ConfigError::Syntax { line: self.linenr,message: message.to_string(), })
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum DemoKind {
    Triangle,  // one triangle, colour derived from position
    Textures,  // indexed quad with vertex colours and a texture
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(Debug,PartialEq)]
pub struct Demo {
    pub name: String,
    pub kind: DemoKind,
    pub title: String,
    pub size: (u32,u32),
    pub clear: ClearColor,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub texture: Option<String>,
    pub unit: u32,
    pub uniforms: Vec<(String,UniformValue)>,
}

impl Demo {
    pub fn new(name: &str,kind: DemoKind) -> Demo {
        Demo {
            name: name.to_string(),
            kind: kind,
            title: "My Window Review".to_string(),
            size: (320,320),
            clear: ClearColor { r: 0.2,g: 0.3,b: 0.3, },
            vertex: None,
            fragment: None,
            texture: None,
            unit: 1,
            uniforms: Vec::new(),
        }
    }
}

fn parse_f32<R: BufRead>(parser: &Parser<R>,value: &str) -> Result<f32,ConfigError> {
    match value.trim().parse::<f32>() {
        Ok(value) => Ok(value),
        Err(_) => parser.error(&format!("number expected, found {:?}",value)),
    }
}

fn parse_size<R: BufRead>(parser: &Parser<R>,value: &str) -> Result<(u32,u32),ConfigError> {
    let comp: Vec<&str> = value.split(',').collect();
    if comp.len() != 2 {
        return parser.error("size has 2 parameters: width and height");
    }
    match (comp[0].trim().parse::<u32>(),comp[1].trim().parse::<u32>()) {
        (Ok(w),Ok(h)) if (w > 0) && (h > 0) => Ok((w,h)),
        _ => parser.error("size should be two positive integers"),
    }
}

fn parse_rgb<R: BufRead>(parser: &mut Parser<R>) -> Result<ClearColor,ConfigError> {
    let mut color = ClearColor { r: 0.0,g: 0.0,b: 0.0, };
    let current_indent = match &parser.line {
        Some(line) => line.indent,
        None => return parser.error("missing color specification"),
    };
    while let Some(line) = &parser.line {
        if line.indent < current_indent {
            break;
        }
        let value = parse_f32(parser,&line.value)?;
        match line.key.as_str() {
            "r" => color.r = value,
            "g" => color.g = value,
            "b" => color.b = value,
            _ => return parser.error("r, g or b expected"),
        }
        parser.accept()?;
    }
    Ok(color)
}

fn parse_uniform<R: BufRead>(parser: &Parser<R>,value: &str) -> Result<UniformValue,ConfigError> {
    let mut words = value.split_whitespace();
    let (kind,value) = match (words.next(),words.next(),words.next()) {
        (Some(kind),Some(value),None) => (kind,value),
        _ => return parser.error("uniform should be <bool|int|float> <value>"),
    };
    match kind {
        "bool" => match value {
            "true" => Ok(UniformValue::Bool(true)),
            "false" => Ok(UniformValue::Bool(false)),
            _ => parser.error("true or false expected"),
        },
        "int" => match value.parse::<i32>() {
            Ok(value) => Ok(UniformValue::Int(value)),
            Err(_) => parser.error("integer expected"),
        },
        "float" => Ok(UniformValue::Float(parse_f32(parser,value)?)),
        _ => parser.error("uniform type should be bool, int or float"),
    }
}

// Entries are dashed and may sit at the key's own indent. The list ends at
// the first undashed line that is not deeper than the key.
fn parse_uniforms<R: BufRead>(parser: &mut Parser<R>,key_indent: usize) -> Result<Vec<(String,UniformValue)>,ConfigError> {
    let mut uniforms = Vec::new();
    while let Some(line) = &parser.line {
        if line.indent < key_indent {
            break;
        }
        if !line.dashed {
            if line.indent == key_indent {
                break;
            }
            return parser.error("uniforms are listed as - name: type value");
        }
        let value = parse_uniform(parser,&line.value)?;
        uniforms.push((line.key.clone(),value));
        parser.accept()?;
    }
    Ok(uniforms)
}

fn parse_demo<R: BufRead>(parser: &mut Parser<R>,name: String) -> Result<Demo,ConfigError> {
    let mut demo = Demo::new(&name,DemoKind::Triangle);
    while let Some(line) = &parser.line {
        if line.indent == 0 {
            break;
        }
        match line.key.as_str() {
            "kind" => {
                demo.kind = match line.value.as_str() {
                    "triangle" => DemoKind::Triangle,
                    "textures" => DemoKind::Textures,
                    _ => return parser.error("invalid demo kind (should be triangle or textures)"),
                };
                parser.accept()?;
            },
            "title" => {
                demo.title = line.value.clone();
                parser.accept()?;
            },
            "size" => {
                demo.size = parse_size(parser,&line.value)?;
                parser.accept()?;
            },
            "clear" => {
                parser.accept()?;
                demo.clear = parse_rgb(parser)?;
            },
            "vertex" => {
                demo.vertex = Some(line.value.clone());
                parser.accept()?;
            },
            "fragment" => {
                demo.fragment = Some(line.value.clone());
                parser.accept()?;
            },
            "texture" => {
                demo.texture = Some(line.value.clone());
                parser.accept()?;
            },
            "unit" => {
                demo.unit = match line.value.parse::<u32>() {
                    Ok(unit) if unit < 16 => unit,
                    _ => return parser.error("texture unit should be 0..15"),
                };
                parser.accept()?;
            },
            "uniforms" => {
                let indent = line.indent;
                parser.accept()?;
                demo.uniforms = parse_uniforms(parser,indent)?;
            },
            _ => {
                let message = format!("invalid key {}",line.key);
                return parser.error(&message);
            },
        }
    }
    Ok(demo)
}

/// Parse demos from any buffered reader.
pub fn parse_config<R: BufRead>(reader: R) -> Result<Vec<Demo>,ConfigError> {
    let mut parser = Parser {
        lines: reader.lines(),
        linenr: 0usize,
        line: None,
    };
    parser.accept()?;
    let mut demos: Vec<Demo> = Vec::new();
    while let Some(line) = &parser.line {
        if line.indent != 0 {
            return parser.error("demo should start at first column");
        }
        let name = line.key.clone();
        parser.accept()?;
        let demo = parse_demo(&mut parser,name)?;
        debug!("demo {}: {:?}",demo.name,demo);
        demos.push(demo);
    }
    Ok(demos)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Vec<Demo>,ConfigError> {
    let file = File::open(path)?;
    parse_config(BufReader::new(file))
}
