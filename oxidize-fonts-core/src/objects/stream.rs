use crate::objects::{Dictionary, Object};

#[derive(Debug, Clone)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.set("Length", data.len());

        Self { dictionary, data }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.dictionary.set("Filter", Object::name(filter));
    }

    pub fn into_object(self) -> Object {
        Object::Stream(self.dictionary, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_new() {
        let data = vec![1, 2, 3, 4, 5];
        let stream = Stream::new(data.clone());

        assert_eq!(stream.data(), &data);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_set_filter() {
        let mut stream = Stream::new(vec![1, 2, 3]);

        stream.set_filter("FlateDecode");
        assert_eq!(
            stream.dictionary().get("Filter"),
            Some(&Object::Name("FlateDecode".to_string()))
        );
    }

    #[test]
    fn test_length_stays_first_key() {
        let mut stream = Stream::new(vec![0; 8]);
        stream.set_filter("FlateDecode");
        stream.dictionary_mut().set("Length1", 8);
        stream.dictionary_mut().set("Length", 4);

        let keys: Vec<_> = stream.dictionary().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Length", "Filter", "Length1"]);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(4)));
    }

    #[test]
    fn test_into_object() {
        let stream = Stream::new(vec![9, 9]);
        match stream.into_object() {
            Object::Stream(dict, data) => {
                assert_eq!(dict.get("Length"), Some(&Object::Integer(2)));
                assert_eq!(data, vec![9, 9]);
            }
            other => panic!("Expected stream object, got {other:?}"),
        }
    }
}
